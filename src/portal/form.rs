//! A minimal model of an HTML form: find it on a page, populate its fields
//! and submit it the way a browser would.

use crate::Result;
use anyhow::{anyhow, Context};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A form lifted off an HTML page: the resolved action URL, the method, and
/// the fields a browser would submit (inputs including hidden view state,
/// selected options, textareas).
#[derive(Debug, Clone)]
pub(crate) struct HtmlForm {
    action: Url,
    method: String,
    fields: Vec<(String, String)>,
}

impl HtmlForm {
    /// Finds the form matching `form_selector` on `page` and captures its
    /// submittable fields. The action URL is resolved against `page_url`.
    pub(crate) fn find(page_url: &Url, page: &str, form_selector: &str) -> Result<Self> {
        let document = Html::parse_document(page);
        let form = document
            .select(&selector(form_selector)?)
            .next()
            .with_context(|| format!("no form matching {form_selector} on {page_url}"))?;

        let action = match form.value().attr("action") {
            Some(action) if !action.is_empty() => page_url
                .join(action)
                .with_context(|| format!("invalid form action: {action}"))?,
            // A missing action submits back to the page itself.
            _ => page_url.clone(),
        };
        let method = form
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_ascii_lowercase();
        let fields = collect_fields(form)?;

        Ok(Self {
            action,
            method,
            fields,
        })
    }

    pub(crate) fn action(&self) -> &Url {
        &self.action
    }

    /// Sets an existing field. Fails if the form has no field named `name`:
    /// on this portal a missing field means we are not on the page we think
    /// we are on.
    pub(crate) fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .with_context(|| format!("form has no field named {name}"))?;
        field.1 = value.to_string();
        Ok(())
    }

    /// Sets a field, adding it when absent. Image click coordinates are
    /// submitted without ever being rendered as inputs.
    pub(crate) fn insert(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(field) => field.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    /// Submits the form through `client` and returns the raw response.
    pub(crate) async fn submit(&self, client: &reqwest::Client) -> Result<reqwest::Response> {
        let request = if self.method == "post" {
            client.post(self.action.clone()).form(&self.fields)
        } else {
            client.get(self.action.clone()).query(&self.fields)
        };
        let response = request
            .send()
            .await
            .with_context(|| format!("failed to submit form to {}", self.action))?
            .error_for_status()
            .with_context(|| format!("form submission to {} was rejected", self.action))?;
        Ok(response)
    }

    #[cfg(test)]
    pub(crate) fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Resolves the href of the first element matching `link_selector` against
/// `page_url`.
pub(crate) fn find_link(page_url: &Url, page: &str, link_selector: &str) -> Result<Url> {
    let document = Html::parse_document(page);
    let link = document
        .select(&selector(link_selector)?)
        .next()
        .with_context(|| format!("no link matching {link_selector} on {page_url}"))?;
    let href = link
        .value()
        .attr("href")
        .with_context(|| format!("link {link_selector} has no href"))?;
    page_url
        .join(href)
        .with_context(|| format!("invalid link target: {href}"))
}

/// Collects the fields a browser would include when submitting `form`.
fn collect_fields(form: ElementRef<'_>) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::new();

    for input in form.select(&selector("input")?) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let kind = input
            .value()
            .attr("type")
            .unwrap_or("text")
            .to_ascii_lowercase();
        match kind.as_str() {
            // Buttons only submit when clicked; we synthesize clicks with
            // `insert` instead.
            "submit" | "image" | "button" | "reset" | "file" => {}
            "checkbox" | "radio" => {
                if input.value().attr("checked").is_some() {
                    let value = input.value().attr("value").unwrap_or("on");
                    fields.push((name.to_string(), value.to_string()));
                }
            }
            _ => {
                let value = input.value().attr("value").unwrap_or("");
                fields.push((name.to_string(), value.to_string()));
            }
        }
    }

    let option_selector = selector("option")?;
    for select in form.select(&selector("select")?) {
        let Some(name) = select.value().attr("name") else {
            continue;
        };
        let options: Vec<_> = select.select(&option_selector).collect();
        let chosen = options
            .iter()
            .find(|option| option.value().attr("selected").is_some())
            .or_else(|| options.first());
        if let Some(option) = chosen {
            let value = match option.value().attr("value") {
                Some(value) => value.to_string(),
                None => option.text().collect::<String>().trim().to_string(),
            };
            fields.push((name.to_string(), value));
        }
    }

    for textarea in form.select(&selector("textarea")?) {
        let Some(name) = textarea.value().attr("name") else {
            continue;
        };
        fields.push((name.to_string(), textarea.text().collect::<String>()));
    }

    Ok(fields)
}

fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow!("invalid selector {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <form id="form1" method="post" action="login.aspx">
            <input type="hidden" name="__VIEWSTATE" value="dDwtMTIw" />
            <input type="hidden" name="__EVENTVALIDATION" value="ABC123" />
            <input type="text" name="tb_USER_ID" value="" />
            <input type="password" name="tb_USER_PSWD" />
            <input type="checkbox" name="remember" value="yes" />
            <input type="image" name="img_LOGIN" src="login.gif" />
            <select name="dl_ACCOUNT">
                <option value="111">Home</option>
                <option value="222" selected>Cabin</option>
            </select>
        </form>
        </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://portal.example.com/account/default.aspx").unwrap()
    }

    #[test]
    fn test_find_captures_fields() {
        let form = HtmlForm::find(&page_url(), PAGE, "#form1").unwrap();
        assert_eq!(
            form.action().as_str(),
            "https://portal.example.com/account/login.aspx"
        );
        // Hidden view state is captured, the unchecked checkbox and the image
        // button are not.
        assert_eq!(
            form.fields(),
            &[
                ("__VIEWSTATE".to_string(), "dDwtMTIw".to_string()),
                ("__EVENTVALIDATION".to_string(), "ABC123".to_string()),
                ("tb_USER_ID".to_string(), String::new()),
                ("tb_USER_PSWD".to_string(), String::new()),
                ("dl_ACCOUNT".to_string(), "222".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_missing_form() {
        let result = HtmlForm::find(&page_url(), "<html><body></body></html>", "#form1");
        assert!(result.is_err());
    }

    #[test]
    fn test_set_existing_field() {
        let mut form = HtmlForm::find(&page_url(), PAGE, "#form1").unwrap();
        form.set("tb_USER_ID", "alice").unwrap();
        assert!(form
            .fields()
            .contains(&("tb_USER_ID".to_string(), "alice".to_string())));
    }

    #[test]
    fn test_set_missing_field_fails() {
        let mut form = HtmlForm::find(&page_url(), PAGE, "#form1").unwrap();
        assert!(form.set("no_such_field", "x").is_err());
    }

    #[test]
    fn test_insert_adds_field() {
        let mut form = HtmlForm::find(&page_url(), PAGE, "#form1").unwrap();
        form.insert("img_EXCEL_DOWNLOAD_IMAGE.x", "7");
        assert!(form
            .fields()
            .contains(&("img_EXCEL_DOWNLOAD_IMAGE.x".to_string(), "7".to_string())));
    }

    #[test]
    fn test_find_link() {
        let page = r#"<div id="dailyMenu"><a href="../reports/daily.aspx">Daily</a></div>"#;
        let target = find_link(&page_url(), page, "#dailyMenu a").unwrap();
        assert_eq!(
            target.as_str(),
            "https://portal.example.com/reports/daily.aspx"
        );
    }

    #[test]
    fn test_find_link_missing() {
        assert!(find_link(&page_url(), "<html></html>", "#dailyMenu a").is_err());
    }
}
