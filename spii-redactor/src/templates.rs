//! Embedded HTML templates for the upload gateway.
//!
//! Templates live under `templates/` and are compiled into the binary. A
//! process-wide minijinja environment is built lazily on first render.

use axum::response::Html;
use minijinja::Environment;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

static ENVIRONMENT: OnceLock<Environment<'static>> = OnceLock::new();

fn environment() -> &'static Environment<'static> {
    ENVIRONMENT.get_or_init(|| {
        let mut env = Environment::new();
        for name in Templates::iter() {
            let file = Templates::get(&name).expect("embedded template listed but not present");
            let source = String::from_utf8(file.data.into_owned()).expect("embedded template is not UTF-8");
            env.add_template_owned(name.to_string(), source).expect("embedded template failed to parse");
        }
        env
    })
}

/// Render an embedded template to an HTML response body.
pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<Html<String>, minijinja::Error> {
    let template = environment().get_template(name)?;
    Ok(Html(template.render(ctx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_render_index() {
        let html = render("index.html", context! {}).unwrap();
        assert!(html.0.contains("<form"));
        assert!(html.0.contains("name=\"file\""));
        assert!(html.0.contains("/upload"));
    }

    #[test]
    fn test_render_result() {
        let html = render(
            "result.html",
            context! {
                redacted_text => "account ####",
                original_image => "statement.png",
            },
        )
        .unwrap();
        assert!(html.0.contains("account ####"));
        assert!(html.0.contains("/uploads/statement.png"));
    }

    #[test]
    fn test_render_result_escapes_html() {
        let html = render(
            "result.html",
            context! {
                redacted_text => "<script>alert(1)</script>",
                original_image => "x.png",
            },
        )
        .unwrap();
        assert!(!html.0.contains("<script>alert(1)</script>"));
        assert!(html.0.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_error() {
        let html = render("error.html", context! { status => 500u16, message => "The document could not be processed" }).unwrap();
        assert!(html.0.contains("500"));
        assert!(html.0.contains("The document could not be processed"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(render("missing.html", context! {}).is_err());
    }
}
