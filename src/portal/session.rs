//! Implements the `Portal` trait against the live site.

use crate::portal::form::{self, HtmlForm};
use crate::portal::{markup, tls, Credentials, Portal, PortalConfig, ReportKind};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use tracing::debug;
use url::Url;

/// The date format the portal's form fields expect.
const FORM_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// One authenticated browsing session against the live portal. Owns the
/// cookie-bound HTTP client and tracks the last loaded page so no form is
/// ever built from a stale location.
pub struct PortalSession {
    config: PortalConfig,
    client: reqwest::Client,
    account: String,
    /// The page the next form will be lifted from.
    page: Page,
    /// Where to come back to between batches.
    report_page: Option<Url>,
}

#[derive(Debug, Clone)]
struct Page {
    url: Url,
    body: String,
}

impl PortalSession {
    /// Builds the HTTP client (cookie jar, browser-like headers, the
    /// incomplete-chain workaround) and loads the portal landing page.
    pub async fn connect(config: PortalConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(markup::USER_AGENT)
            .cookie_store(true);
        for certificate in tls::intermediate_certificates().await? {
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder.build().context("failed to build portal client")?;

        let url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid portal URL: {}", config.base_url))?;
        let mut session = Self {
            config,
            client,
            account: String::new(),
            page: Page {
                url: url.clone(),
                body: String::new(),
            },
            report_page: None,
        };
        session.open(url).await.context("couldn't open site")?;
        Ok(session)
    }

    /// GETs `url` and makes the response the current page.
    async fn open(&mut self, url: Url) -> Result<()> {
        debug!("open {url}");
        let response = self
            .client
            .get(url.clone())
            .header("Accept", markup::ACCEPT)
            .send()
            .await
            .with_context(|| format!("couldn't open {url}"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;
        // Track where redirects actually landed us.
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .with_context(|| format!("couldn't read {url}"))?;
        self.page = Page {
            url: final_url,
            body,
        };
        Ok(())
    }

    /// Submits `form` and makes the response the current page.
    async fn submit(&mut self, form: &HtmlForm) -> Result<()> {
        let response = form.submit(&self.client).await?;
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .with_context(|| format!("couldn't read response from {}", form.action()))?;
        self.page = Page {
            url: final_url,
            body,
        };
        Ok(())
    }

    fn form(&self) -> Result<HtmlForm> {
        HtmlForm::find(&self.page.url, &self.page.body, markup::FORM)
    }
}

#[async_trait::async_trait]
impl Portal for PortalSession {
    async fn login(&mut self, creds: &Credentials) -> Result<()> {
        let mut login_form = self.form().context("couldn't find login form")?;
        login_form
            .set(markup::USER_FIELD, &creds.user)
            .context("couldn't set user id field")?;
        login_form
            .set(markup::PASSWORD_FIELD, &creds.password)
            .context("couldn't set password field")?;
        self.submit(&login_form)
            .await
            .context("failed to submit login")?;

        // A successful login lands on a second form asking which account to
        // work with. If the account field is missing, the credentials were
        // rejected.
        let mut account_form = self.form().context("couldn't find account form")?;
        account_form
            .set(markup::ACCOUNT_FIELD, &creds.account)
            .context("couldn't set account field")?;
        self.submit(&account_form)
            .await
            .context("failed to submit account selection")?;

        self.account = creds.account.clone();
        Ok(())
    }

    async fn open_report(&mut self, kind: ReportKind) -> Result<()> {
        let link_selector = match kind {
            ReportKind::Daily => markup::DAILY_MENU_LINK,
            ReportKind::Hourly => markup::HOURLY_MENU_LINK,
        };
        let target = form::find_link(&self.page.url, &self.page.body, link_selector)
            .with_context(|| format!("failed to select {kind} usage"))?;
        self.open(target).await?;
        self.report_page = Some(self.page.url.clone());
        Ok(())
    }

    async fn download_batch(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<String> {
        if self.report_page.is_none() {
            bail!("no report page selected");
        }

        // Self-imposed backpressure; the portal throttles aggressive clients.
        tokio::time::sleep(self.config.batch_delay).await;

        let mut dl_form = self.form().context("couldn't find dl form")?;
        for (name, value) in markup::EXPORT_CLICK {
            dl_form.insert(name, value);
        }
        dl_form
            .set(markup::ACCOUNT_FIELD, &self.account)
            .context("couldn't set account field")?;
        if let Some(start) = start {
            dl_form
                .set(
                    markup::START_DATE_FIELD,
                    &start.format(FORM_DATE_FORMAT).to_string(),
                )
                .context("couldn't set start date field")?;
        }
        if let Some(end) = end {
            // The portal treats the end date as inclusive.
            let inclusive = end
                .pred_opt()
                .context("couldn't compute inclusive end date")?;
            dl_form
                .set(
                    markup::END_DATE_FIELD,
                    &inclusive.format(FORM_DATE_FORMAT).to_string(),
                )
                .context("couldn't set end date field")?;
        }

        // The submission answers with the export payload itself. Capture it
        // as text; do not treat it as a page navigation.
        let response = dl_form
            .submit(&self.client)
            .await
            .context("couldn't submit dl form")?;
        let payload = response
            .text()
            .await
            .context("failed to download usage data")?;
        Ok(payload)
    }

    async fn return_to_report(&mut self) -> Result<()> {
        let report_page = self
            .report_page
            .clone()
            .context("no report page to return to")?;
        self.open(report_page)
            .await
            .context("failed to return to the report page")
    }
}
