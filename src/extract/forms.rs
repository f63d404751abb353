use super::{attr_or_empty, resolve, selector, ExtractResult, Extractor, PageInput};
use crate::store::{AntiSpam, FormEntry, FormField, FormValidation, PageRecord};
use scraper::{ElementRef, Selector};

/// Hidden-field name fragments that mark a honeypot
const HONEYPOT_HINTS: &[&str] = &["website", "url", "honeypot", "bot"];

/// Method, action, fields and anti-automation signals of every form
pub struct FormsExtractor {
    forms: Selector,
    fields: Selector,
    recaptcha: Selector,
    hidden: Selector,
}

impl FormsExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            forms: selector("form")?,
            fields: selector("input, select, textarea")?,
            recaptcha: selector(
                r#"div[class*="g-recaptcha"], input[name="g-recaptcha-response"]"#,
            )?,
            hidden: selector(r#"input[type="hidden"]"#)?,
        })
    }

    fn form_entry(&self, page: &PageInput<'_>, form: ElementRef<'_>) -> FormEntry {
        let method = form
            .value()
            .attr("method")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("GET")
            .to_uppercase();

        let raw_action = attr_or_empty(&form, "action");
        let action = if raw_action.is_empty() {
            method.clone()
        } else {
            format!("{} {}", method, resolve(page.url, &raw_action))
        };

        let has_recaptcha = form.select(&self.recaptcha).next().is_some();
        let fields: Vec<FormField> = form.select(&self.fields).map(field).collect();

        let honeypot_field = form.select(&self.hidden).find_map(|input| {
            let name = attr_or_empty(&input, "name").to_lowercase();
            HONEYPOT_HINTS
                .iter()
                .any(|hint| name.contains(hint))
                .then_some(name)
        });

        let client = if fields.iter().any(|f| f.required) {
            vec!["required".to_string()]
        } else {
            Vec::new()
        };

        FormEntry {
            page_url: page.url.to_string(),
            form_name: attr_or_empty(&form, "name"),
            action,
            method,
            has_recaptcha,
            fields_count: fields.len(),
            fields,
            antispam: AntiSpam {
                recaptcha: has_recaptcha,
                honeypot_field,
            },
            validation: FormValidation {
                client,
                server: Vec::new(),
            },
        }
    }
}

fn field(element: ElementRef<'_>) -> FormField {
    let tag = element.value().name();
    let declared = attr_or_empty(&element, "type");
    let field_type = if declared.is_empty() {
        "text".to_string()
    } else {
        declared.to_lowercase()
    };

    // minlength only counts on free-text inputs
    let minlength = match (tag, field_type.as_str()) {
        ("textarea", _) | ("input", "text") => element
            .value()
            .attr("minlength")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
        _ => None,
    };

    FormField {
        name: attr_or_empty(&element, "name"),
        field_type,
        required: element.value().attr("required").is_some(),
        minlength,
    }
}

impl Extractor for FormsExtractor {
    fn name(&self) -> &'static str {
        "forms"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        Ok(page
            .document
            .select(&self.forms)
            .map(|form| PageRecord::Form(self.form_entry(page, form)))
            .collect())
    }
}
