use std::env;
use std::fs;
use std::path::Path;

// Variables que el crate lee con option_env! (ver src/config.rs)
const KNOWN_KEYS: &[&str] = &[
    "BODEGA_API_URL",
    "BODEGA_ENVIRONMENT",
    "BODEGA_ENABLE_LOGGING",
    "BODEGA_SYNC_INTERVAL_SECS",
    "BODEGA_BACKOFF_BASE_SECS",
    "BODEGA_BACKOFF_MAX_SECS",
    "BODEGA_CACHE_VERSION",
];

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let value = value.trim().trim_matches('"');
    Some((key.trim(), value))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");
    for key in KNOWN_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }

    let env_file = Path::new(".env");
    let contents = match fs::read_to_string(env_file) {
        Ok(contents) => contents,
        Err(_) => return, // sin .env se usan los valores por defecto de config.rs
    };

    for (key, value) in contents.lines().filter_map(parse_env_line) {
        if !KNOWN_KEYS.contains(&key) {
            println!("cargo:warning=.env: variable desconocida '{}' ignorada", key);
            continue;
        }
        // El entorno del proceso tiene prioridad sobre .env
        if env::var(key).is_err() {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }
}
