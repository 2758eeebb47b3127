use crate::host::EditorHost;

/// `[[title]]`, or `[[title|alias]]` when an alias is given.
pub fn wikilink(title: &str, alias: &str) -> String {
    if alias.is_empty() {
        format!("[[{title}]]")
    } else {
        format!("[[{title}|{alias}]]")
    }
}

/// A link with an empty target slot, plus how far to back the caret into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate {
    pub text: String,
    /// Characters to move back from the end of `text`.
    pub caret_back: usize,
}

pub fn alias_template(alias: &str) -> LinkTemplate {
    if alias.is_empty() {
        LinkTemplate {
            text: "[[]]".to_string(),
            caret_back: 2,
        }
    } else {
        LinkTemplate {
            text: format!("[[|{alias}]]"),
            caret_back: 3 + alias.chars().count(),
        }
    }
}

/// Replace the selection with an alias template and park the caret in the target slot.
pub fn insert_alias_template(host: &mut impl EditorHost) -> LinkTemplate {
    let template = alias_template(&host.selection());
    host.replace_selection(&template.text);
    host.move_cursor_back(template.caret_back);
    tracing::debug!("inserted alias template {:?}", template.text);
    template
}
