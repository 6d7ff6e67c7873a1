//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use markup5ever_rcdom::Handle;

    use localize_html::core::{
        key_from_attribute, localize_html_files, LocalizeOptions, LocalizeResult,
    };
    use localize_html::diagnostics::DiagnosticKind;
    use localize_html::discovery::GlobDiscovery;
    use localize_html::parsers::html::{
        find_elements, get_document_element, get_node_attr, set_node_attr,
    };
    use localize_html::translations::TranslationTable;

    use crate::common::{hello_table, Site, HELLO_TEMPLATE};

    fn hello_options() -> LocalizeOptions {
        LocalizeOptions::new(hello_table(), "[data-i18n]", key_from_attribute("data-i18n"))
    }

    #[test]
    fn one_copy_per_language() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);

        let diagnostics = localize_html_files(site.root(), &hello_options()).unwrap();

        assert!(site
            .read("en/index.html")
            .contains(r#"<div data-i18n="hello">Hello</div>"#));
        assert!(site
            .read("fr/index.html")
            .contains(r#"<div data-i18n="hello">Bonjour</div>"#));
        assert_eq!(site.read("index.html"), HELLO_TEMPLATE);
        assert_eq!(diagnostics.artifact_count(), 2);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn every_file_in_every_language() {
        let site = Site::with_files(&[
            ("index.html", HELLO_TEMPLATE),
            ("about.html", r#"<h1 data-i18n="hello"></h1>"#),
        ]);

        let diagnostics = localize_html_files(site.root(), &hello_options()).unwrap();

        for language in ["en", "fr"] {
            for file in ["index.html", "about.html"] {
                assert!(site.exists(&format!("{}/{}", language, file)));
            }
        }

        let summary = diagnostics.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].0, site.path("about.html"));
        assert_eq!(
            summary[0].1,
            vec![site.path("en/about.html"), site.path("fr/about.html")]
        );
    }

    #[test]
    fn deletes_sources_after_all_languages() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options().with_delete_source_html_files(true);

        let diagnostics = localize_html_files(site.root(), &options).unwrap();

        assert!(!site.exists("index.html"));
        assert!(site.exists("en/index.html"));
        assert!(site.exists("fr/index.html"));
        assert!(diagnostics.events().iter().any(|event| matches!(
            &event.kind,
            DiagnosticKind::SourceDeleted { path } if path == &site.path("index.html")
        )));
    }

    #[test]
    fn empty_directory() {
        let site = Site::new();

        let diagnostics = localize_html_files(site.root(), &hello_options()).unwrap();

        assert!(diagnostics.is_discovery_empty());
        assert_eq!(diagnostics.artifact_count(), 0);
        assert_eq!(diagnostics.events().len(), 1);
        assert!(!site.exists("en"));
    }

    #[test]
    fn rerun_is_byte_identical() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options();

        localize_html_files(site.root(), &options).unwrap();
        let first = site.read_bytes("fr/index.html");
        let diagnostics = localize_html_files(site.root(), &options).unwrap();

        assert_eq!(site.read_bytes("fr/index.html"), first);
        // 生成的语言目录不会被当作模板再次处理
        assert_eq!(diagnostics.artifact_count(), 2);
        assert!(!site.exists("en/en/index.html"));
    }

    #[test]
    fn languages_do_not_leak_into_each_other() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options().with_modify_element(|element, _, meta| {
            set_node_attr(
                element,
                &format!("data-seen-{}", meta.language),
                Some("yes".to_string()),
            );
            Ok(())
        });

        localize_html_files(site.root(), &options).unwrap();

        let en = site.read("en/index.html");
        let fr = site.read("fr/index.html");
        assert!(en.contains("data-seen-en"));
        assert!(!en.contains("data-seen-fr"));
        assert!(fr.contains("data-seen-fr"));
        assert!(!fr.contains("data-seen-en"));
    }

    #[test]
    fn hooks_run_in_order() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        let before_log = Rc::clone(&log);
        let element_log = Rc::clone(&log);
        let after_log = Rc::clone(&log);

        let options = hello_options()
            .with_modify_document_before(move |dom, meta| {
                before_log
                    .borrow_mut()
                    .push(format!("before:{}", meta.language));
                for node in find_elements(&dom.document, &|node: &Handle| {
                    get_node_attr(node, "data-i18n").is_some()
                }) {
                    set_node_attr(&node, "data-stage", Some("before".to_string()));
                }
                if let Some(html) = get_document_element(dom) {
                    set_node_attr(&html, "data-stage", Some("before".to_string()));
                }
                Ok(())
            })
            .with_modify_element(move |element, value, meta| {
                let stage = get_node_attr(element, "data-stage").unwrap_or_default();
                element_log
                    .borrow_mut()
                    .push(format!("element:{}:{}:{}", meta.language, value, stage));
                Ok(())
            })
            .with_modify_document_after(move |dom, meta| {
                let stage = get_document_element(dom)
                    .and_then(|html| get_node_attr(&html, "data-stage"))
                    .unwrap_or_default();
                after_log
                    .borrow_mut()
                    .push(format!("after:{}:{}", meta.language, stage));
                Ok(())
            });

        localize_html_files(site.root(), &options).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "before:en",
                "element:en:Hello:before",
                "after:en:before",
                "before:fr",
                "element:fr:Bonjour:before",
                "after:fr:before",
            ]
        );
    }

    #[test]
    fn format_hook_receives_value_and_element_hook_raw_value() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options()
            .with_format_translation(|value, meta| {
                Ok(format!("<em>{}</em> ({})", value, meta.key))
            })
            .with_modify_element(|element, value, _| {
                set_node_attr(element, "title", Some(value.to_string()));
                Ok(())
            });

        localize_html_files(site.root(), &options).unwrap();

        assert!(site
            .read("en/index.html")
            .contains(r#"<div data-i18n="hello" title="Hello"><em>Hello</em> (hello)</div>"#));
    }

    #[test]
    fn missing_key_falls_back_to_empty() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let table = TranslationTable::new().with_language("en", Vec::<(String, String)>::new());
        let options =
            LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"));

        let diagnostics = localize_html_files(site.root(), &options).unwrap();

        assert!(site
            .read("en/index.html")
            .contains(r#"<div data-i18n="hello"></div>"#));
        assert_eq!(
            diagnostics.missing_translations().collect::<Vec<_>>(),
            vec![("hello", "en")]
        );
    }

    #[test]
    fn missing_key_not_reported_when_quiet_or_filtered() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let table = TranslationTable::new().with_language("en", Vec::<(String, String)>::new());

        let quiet = LocalizeOptions::new(
            table.clone(),
            "[data-i18n]",
            key_from_attribute("data-i18n"),
        )
        .with_verbose(false);
        let diagnostics = localize_html_files(site.root(), &quiet).unwrap();
        assert_eq!(diagnostics.missing_translations().count(), 0);

        let filtered = LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"))
            .with_missing_translation_verbose_filter(|key, language, translations| {
                assert!(translations.is_empty());
                !(key == "hello" && language == "en")
            });
        let diagnostics = localize_html_files(site.root(), &filtered).unwrap();
        assert_eq!(diagnostics.missing_translations().count(), 0);

        // 内容仍然被清空
        assert!(site
            .read("en/index.html")
            .contains(r#"<div data-i18n="hello"></div>"#));
    }

    #[test]
    fn unselected_elements_are_untouched() {
        let site = Site::with_files(&[(
            "index.html",
            r#"<p data-i18n="hello">a</p><p class="x" data-i18n="hello">b</p>"#,
        )]);
        let options = LocalizeOptions::new(
            hello_table(),
            "p.x[data-i18n]",
            key_from_attribute("data-i18n"),
        );

        localize_html_files(site.root(), &options).unwrap();

        let en = site.read("en/index.html");
        assert!(en.contains(r#"<p data-i18n="hello">a</p>"#));
        assert!(en.contains(r#"<p class="x" data-i18n="hello">Hello</p>"#));
    }

    #[test]
    fn custom_discovery() {
        let site = Site::with_files(&[
            ("pages/one.html", HELLO_TEMPLATE),
            ("index.html", HELLO_TEMPLATE),
        ]);
        let options = hello_options().with_discovery(GlobDiscovery::new(["pages/*.html"]));

        localize_html_files(site.root(), &options).unwrap();

        assert!(site.exists("pages/en/one.html"));
        assert!(!site.exists("en/index.html"));

        let only = site.path("index.html");
        let options = hello_options().with_discovery(move |_: &Path| -> LocalizeResult<Vec<PathBuf>> {
            Ok(vec![only.clone()])
        });
        localize_html_files(site.root(), &options).unwrap();

        assert!(site.exists("en/index.html"));
    }

    #[test]
    fn duplicate_discovered_paths_are_processed_once() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let source = site.path("index.html");
        let options = hello_options()
            .with_discovery(move |_: &Path| -> LocalizeResult<Vec<PathBuf>> {
                Ok(vec![source.clone(), source.clone()])
            })
            .with_delete_source_html_files(true);

        let diagnostics = localize_html_files(site.root(), &options).unwrap();

        assert_eq!(diagnostics.artifact_count(), 2);
        assert!(site.exists("en/index.html"));
        assert!(site.exists("fr/index.html"));
        assert!(!site.exists("index.html"));
    }

    #[test]
    fn non_utf8_templates_keep_their_encoding() {
        let site = Site::new();
        site.write("index.html", b"<p data-i18n=\"cafe\">caf\xe9</p>".to_vec());
        let table = TranslationTable::new().with_language("fr", [("cafe", "Café crème")]);
        let options = LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"))
            .with_encoding("windows-1252");

        localize_html_files(site.root(), &options).unwrap();

        let output = site.read_bytes("fr/index.html");
        let expected: &[u8] = b"Caf\xe9 cr\xe8me";
        assert!(output.windows(expected.len()).any(|window| window == expected));
    }

    #[test]
    fn written_destinations_are_reported() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);

        let diagnostics = localize_html_files(site.root(), &hello_options()).unwrap();

        let destinations: Vec<PathBuf> = diagnostics
            .events()
            .iter()
            .filter_map(|event| match &event.kind {
                DiagnosticKind::ArtifactWritten { destination, .. } => Some(destination.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            destinations,
            vec![site.path("en/index.html"), site.path("fr/index.html")]
        );
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use markup5ever_rcdom::Handle;

    use localize_html::core::{
        key_from_attribute, localize_html_files, HookKind, LocalizeError, LocalizeOptions,
    };
    use localize_html::translations::TranslationTable;

    use crate::common::{hello_table, Site, HELLO_TEMPLATE};

    fn hello_options() -> LocalizeOptions {
        LocalizeOptions::new(hello_table(), "[data-i18n]", key_from_attribute("data-i18n"))
    }

    #[test]
    fn hook_failure_aborts_without_deleting_sources() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options()
            .with_delete_source_html_files(true)
            .with_modify_document_after(|_, meta| {
                if meta.language == "fr" {
                    Err("fr is broken".into())
                } else {
                    Ok(())
                }
            });

        let error = localize_html_files(site.root(), &options).unwrap_err();

        match &error {
            LocalizeError::Hook {
                hook,
                file,
                language,
                ..
            } => {
                assert_eq!(*hook, HookKind::ModifyDocumentAfter);
                assert_eq!(file, &site.path("index.html"));
                assert_eq!(language, "fr");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(error.to_string().contains("fr is broken"));

        assert!(site.exists("index.html"));
        // 已写入的语言保留
        assert!(site.exists("en/index.html"));
        assert!(!site.exists("fr/index.html"));
    }

    #[test]
    fn key_extractor_failure() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = LocalizeOptions::new(hello_table(), "div", |_: &Handle| {
            Err("no key".into())
        });

        let error = localize_html_files(site.root(), &options).unwrap_err();

        assert!(matches!(
            error,
            LocalizeError::Hook {
                hook: HookKind::GetTranslationKey,
                ..
            }
        ));
        assert!(!site.exists("en"));
    }

    #[test]
    fn format_failure() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options().with_format_translation(|_, _| Err("bad format".into()));

        assert!(matches!(
            localize_html_files(site.root(), &options),
            Err(LocalizeError::Hook {
                hook: HookKind::FormatTranslation,
                ..
            })
        ));
    }

    #[test]
    fn unsupported_selector() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options =
            LocalizeOptions::new(hello_table(), "div:first-child", key_from_attribute("data-i18n"));

        assert!(matches!(
            localize_html_files(site.root(), &options),
            Err(LocalizeError::Config(_))
        ));
        assert!(!site.exists("en"));
    }

    #[test]
    fn no_languages() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = LocalizeOptions::new(
            TranslationTable::new(),
            "[data-i18n]",
            key_from_attribute("data-i18n"),
        );

        assert!(matches!(
            localize_html_files(site.root(), &options),
            Err(LocalizeError::Config(_))
        ));
    }

    #[test]
    fn language_code_escaping_directory() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = LocalizeOptions::new(
            TranslationTable::new().with_language("../en", [("hello", "Hello")]),
            "[data-i18n]",
            key_from_attribute("data-i18n"),
        );

        assert!(matches!(
            localize_html_files(site.root(), &options),
            Err(LocalizeError::Config(_))
        ));
    }

    #[test]
    fn unknown_encoding() {
        let site = Site::with_files(&[("index.html", HELLO_TEMPLATE)]);
        let options = hello_options().with_encoding("klingon");

        assert!(matches!(
            localize_html_files(site.root(), &options),
            Err(LocalizeError::Config(_))
        ));
    }
}
