//! `{{NAME}}` placeholder substitution for wrapper and config templates.

/// A text template with `{{NAME}}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct Template<'a> {
    text: &'a str,
}

impl<'a> Template<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Substitute every placeholder in one pass and fail on the first one
    /// without a value.
    ///
    /// Substituted text is copied as is, so placeholders inside values are
    /// left alone. The error carries the unresolved placeholder's name.
    pub fn render<K, V>(&self, values: &[(K, V)]) -> Result<String, String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let name = after.find("}}").map(|end| &after[..end]).filter(|n| is_placeholder(n));
            match name {
                Some(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| key.as_ref() == name)
                        .ok_or_else(|| name.to_string())?;
                    out.push_str(value.1.as_ref());
                    rest = &after[name.len() + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn is_placeholder(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let t = Template::new("#include \"{{SOURCE}}\" /* {{SOURCE}} */");
        let out = t.render(&[("SOURCE", "../linux/zlib/adler32.c")]).unwrap();
        assert_eq!(
            out,
            "#include \"../linux/zlib/adler32.c\" /* ../linux/zlib/adler32.c */"
        );
    }

    #[test]
    fn test_render_reports_unresolved() {
        let t = Template::new("{{TARGET_CFG}}\n{{SOURCE}}\n");
        let err = t.render(&[("TARGET_CFG", "cfg(unix)")]).unwrap_err();
        assert_eq!(err, "SOURCE");
    }

    #[test]
    fn test_render_ignores_non_placeholder_braces() {
        let t = Template::new("static int x[] = {{0}};\n{{V}}");
        assert_eq!(t.render(&[("V", "1")]).unwrap(), "static int x[] = {{0}};\n1");
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = Template::new("#define VERSION \"{{VERSION}}\"");
        let a = t.render(&[("VERSION", "0.4.6.10")]).unwrap();
        let b = t.render(&[("VERSION", "0.4.6.10")]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_leaves_values_untouched() {
        let t = Template::new("/* {{TARGET_CFG}} */\n#include \"{{SOURCE}}\"");
        let out = t
            .render(&[("TARGET_CFG", "{{SOURCE}}"), ("SOURCE", "adler32.c")])
            .unwrap();
        assert_eq!(out, "/* {{SOURCE}} */\n#include \"adler32.c\"");
    }
}
