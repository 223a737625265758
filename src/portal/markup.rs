//! Selectors and field names tied to the portal's current markup.
//!
//! The wire contract with the portal is HTML-form based and fragile: these
//! strings match the site as it is rendered today. When the site changes,
//! this table is the only place that should need editing.

/// Landing page. The login form is served from here.
pub(crate) const PORTAL_URL: &str = "https://myaccount.sfwater.org/";

/// The single ASP.NET form present on every page of interest.
pub(crate) const FORM: &str = "#form1";

/// Login form user id field.
pub(crate) const USER_FIELD: &str = "tb_USER_ID";

/// Login form password field.
pub(crate) const PASSWORD_FIELD: &str = "tb_USER_PSWD";

/// Account selection list. Appears on the post-login page and again on the
/// report pages.
pub(crate) const ACCOUNT_FIELD: &str = "dl_ACCOUNT";

/// Report page start date field, `M/D/YYYY`.
pub(crate) const START_DATE_FIELD: &str = "SD";

/// Report page end date field, `M/D/YYYY`. The portal treats this date as
/// inclusive.
pub(crate) const END_DATE_FIELD: &str = "ED";

/// Click coordinates for the image button that triggers the export download.
pub(crate) const EXPORT_CLICK: [(&str, &str); 2] = [
    ("img_EXCEL_DOWNLOAD_IMAGE.x", "7"),
    ("img_EXCEL_DOWNLOAD_IMAGE.y", "2"),
];

/// Menu link to the daily usage report page.
pub(crate) const DAILY_MENU_LINK: &str = "#dailyMenu a";

/// Menu link to the hourly usage report page.
pub(crate) const HOURLY_MENU_LINK: &str = "#hourlyMenu a";

/// The host serves an incomplete certificate chain. These are the CA-issuers
/// URLs of the missing intermediates, taken from the leaf certificate's
/// Authority Information Access extension.
pub(crate) const INTERMEDIATE_CERT_URLS: &[&str] =
    &["http://cacerts.digicert.com/DigiCertTLSRSASHA2562020CA1-1.crt"];

/// The portal rejects requests that don't look like a desktop browser.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Safari/537.36";
pub(crate) const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
