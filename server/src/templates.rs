use std::path::Path;
use tera::Tera;

lazy_static::lazy_static! {
    pub static ref TEMPLATES: Tera = {
        // The binary runs from the workspace root, tests run from the crate dir
        let glob = if Path::new("server/templates").is_dir() {
            "server/templates/**/*.html"
        } else {
            "templates/**/*.html"
        };
        match Tera::new(glob) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("Template parsing error: {}", e);
                std::process::exit(1);
            }
        }
    };
}
