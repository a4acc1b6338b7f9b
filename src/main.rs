use banana_i18next::{
    DirectoryDataSource, HttpDataSource, LocalizationDataSource, Options, ResourceStore,
    Translator, Variables, with_builtin_formatters,
};
use clap::{Arg, Command};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("banana-i18next")
        .version("0.1.0")
        .about("Resolve i18next-style keys and templates")
        .arg(
            Arg::new("input")
                .help("Key to translate, or a template with --template")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .short('l')
                .help("Locale to translate into (default: en)")
                .default_value("en"),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .short('n')
                .help("Default namespace (default: translation)")
                .default_value("translation"),
        )
        .arg(
            Arg::new("fallback")
                .long("fallback")
                .short('f')
                .help("Locale tried when the requested one has no translation"),
        )
        .arg(
            Arg::new("resources")
                .long("resources")
                .short('r')
                .help("Catalog directory (<dir>/<locale>/<namespace>.json) or base URL"),
        )
        .arg(
            Arg::new("vars")
                .long("vars")
                .help("Variables as a JSON object, e.g. '{\"name\": \"Ada\"}'"),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .short('o')
                .help(
                    "Options as a JSON file or inline object, \
                     e.g. '{\"interpolationPrefix\": \"[[\"}'",
                ),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .short('t')
                .help("Treat the input as a template instead of a key")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("warn".parse()?),
        )
        .init();

    let input = matches
        .get_one::<String>("input")
        .ok_or("Missing input")?;
    let locale = matches
        .get_one::<String>("locale")
        .map_or("en", |locale| locale.as_str());
    let namespace = matches
        .get_one::<String>("namespace")
        .map_or("translation", |namespace| namespace.as_str());
    let fallback = matches.get_one::<String>("fallback");

    let options: Options = match matches.get_one::<String>("options") {
        Some(raw) if raw.trim_start().starts_with('{') => serde_json::from_str(raw)?,
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Options::new(),
    };
    let options = with_builtin_formatters(options.with_defaults());
    let variables: Variables = match matches.get_one::<String>("vars") {
        Some(raw) => serde_json::from_str(raw)?,
        None => Variables::new(),
    };

    let is_template = matches.get_flag("template");
    let mut store = ResourceStore::new();
    if let Some(resources) = matches.get_one::<String>("resources") {
        let source: Box<dyn LocalizationDataSource> =
            if resources.starts_with("http://") || resources.starts_with("https://") {
                let namespaces = namespaces_to_fetch(input, namespace, &options, is_template);
                Box::new(HttpDataSource::new(resources.as_str(), namespaces))
            } else {
                Box::new(DirectoryDataSource::new(resources.as_str()))
            };

        let mut locales = vec![locale];
        if let Some((language, _)) = locale.split_once(['-', '_']) {
            locales.push(language);
        }
        if let Some(fallback) = fallback {
            locales.push(fallback.as_str());
        }
        locales.dedup();
        for locale in locales {
            store.load_locale(source.as_ref(), locale).await?;
        }
        debug!("Loaded locales: {:?}", store.locales());
    }

    let mut translator = Translator::new(store).with_default_namespace(namespace);
    if let Some(fallback) = fallback {
        translator = translator.with_fallback_locale(fallback);
    }

    let result = if is_template {
        translator
            .render(locale, namespace, "", input, &variables, &options)
            .map(Some)
    } else {
        translator.translate(input, locale, &variables, &options)
    };

    // Like Translator::t, fall back to the input itself
    match result {
        Ok(Some(output)) => {
            println!("{}", output);
            Ok(())
        }
        Ok(None) => {
            println!("{}", input);
            Err(format!("No translation found for '{}' in locale '{}'", input, locale).into())
        }
        Err(error) => {
            println!("{}", input);
            Err(error.into())
        }
    }
}

/// The default namespace plus the one a qualified key names
fn namespaces_to_fetch(
    input: &str,
    namespace: &str,
    options: &Options,
    is_template: bool,
) -> Vec<String> {
    let mut namespaces = vec![namespace.to_string()];
    if !is_template {
        if let Some((key_namespace, _)) = input.split_once(options.namespace_separator()) {
            if key_namespace != namespace {
                namespaces.push(key_namespace.to_string());
            }
        }
    }
    namespaces
}
