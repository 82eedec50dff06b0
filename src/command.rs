use crate::error::{DeployError, Result};

/// The fixed set of fields a command template may reference.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub remote_app_dir: &'a str,
    pub remote_nginx_dir: &'a str,
    pub domain: &'a str,
    pub server_ip: &'a str,
}

impl<'a> TemplateVars<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "remote_app_dir" => Some(self.remote_app_dir),
            "remote_nginx_dir" => Some(self.remote_nginx_dir),
            "domain" => Some(self.domain),
            "server_ip" => Some(self.server_ip),
            _ => None,
        }
    }
}

/// Substitutes `{name}` placeholders. Fails closed: an unknown name or an
/// unterminated brace is an error, raised before any remote command runs.
pub fn resolve(template: &str, vars: &TemplateVars) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '{' {
            if ch == '}' {
                return Err(template_error(template, "unmatched '}'"));
            }
            resolved.push(ch);
            continue;
        }
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(inner) => name.push(inner),
                None => return Err(template_error(template, "unterminated placeholder")),
            }
        }
        match vars.lookup(&name) {
            Some(value) => resolved.push_str(value),
            None => {
                return Err(template_error(
                    template,
                    &format!("unknown placeholder {{{name}}}"),
                ))
            }
        }
    }
    Ok(resolved)
}

/// Resolves an ordered template list; the first bad template aborts the
/// whole list so nothing partially-resolved ever reaches a session.
pub fn resolve_all(templates: &[String], vars: &TemplateVars) -> Result<Vec<String>> {
    templates
        .iter()
        .map(|template| resolve(template, vars))
        .collect()
}

fn template_error(template: &str, reason: &str) -> DeployError {
    DeployError::Template {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

/// Single-quotes a value for safe interpolation into a remote shell command.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    let escaped = value.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}
