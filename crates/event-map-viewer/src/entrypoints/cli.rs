use clap::Parser;
#[cfg(target_arch = "wasm32")]
use std::collections::HashMap;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static ENV_MAP: std::cell::RefCell<HashMap<String, String>> =
        std::cell::RefCell::new(HashMap::new());
}

/// Program name used as argv[0] when arguments come from a URL
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
const PROGRAM: &str = "event-map";

/// Arguments and runtime slots extracted from a URL query string.
///
/// `cliKEY=VALUE` becomes `--KEY VALUE`, `envKEY=VALUE` becomes a runtime
/// slot readable with [`get_env`].
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Default, PartialEq)]
pub(crate) struct QueryArgs {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn split_query(query: &str) -> QueryArgs {
    let mut out = QueryArgs {
        args: vec![PROGRAM.to_string()],
        env: Vec::new(),
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if let Some(arg_key) = key.strip_prefix("cli").filter(|k| !k.is_empty()) {
            out.args.push(format!("--{arg_key}"));
            if !value.is_empty() {
                out.args.push(value.to_string());
            }
        } else if let Some(env_key) = key.strip_prefix("env").filter(|k| !k.is_empty()) {
            out.env.push((env_key.to_string(), value.to_string()));
        }
    }

    out
}

/// Generic function to get a runtime configuration slot, parsing it to the desired type.
///
/// Native reads the process environment; web reads `env`-prefixed query parameters.
pub fn get_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    #[cfg(target_arch = "wasm32")]
    {
        ENV_MAP.with(|map| map.borrow().get(key).and_then(|s| s.parse().ok()))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var(key).ok().and_then(|s| s.parse().ok())
    }
}

#[cfg(target_arch = "wasm32")]
fn page_query() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .map(|s| s.trim_start_matches('?').to_string())
        .unwrap_or_default()
}

/// Load runtime slots from the page URL (web only; native already has its environment)
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn parse_env() {
    #[cfg(target_arch = "wasm32")]
    {
        let query = split_query(&page_query());
        ENV_MAP.with(|map| map.borrow_mut().extend(query.env));
    }
}

/// Parses from the command line arguments on native and from GET parameters on web.
pub fn parse_args<T: Parser>() -> Result<T, clap::Error> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        T::try_parse()
    }
    #[cfg(target_arch = "wasm32")]
    {
        T::try_parse_from(split_query(&page_query()).args)
    }
}
