//! HTML templates, embedded at compile time.

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("_items.html", include_str!("../templates/_items.html")),
    ("demo.html", include_str!("../templates/demo.html")),
    ("main.html", include_str!("../templates/main.html")),
];

/// Compiled page templates.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Compiles every bundled template.
    ///
    /// # Errors
    ///
    /// Returns a [`minijinja::Error`] if a template has a syntax error.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Renders the template `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns a [`minijinja::Error`] if the template is unknown or rendering fails.
    pub fn render(&self, name: &str, context: impl Serialize) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}
