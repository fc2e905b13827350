use solarwatch_backend::SessionContext;
use solarwatch_status::Locale;

/// Per-request context, inserted by the middleware on every protected route.
///
/// The session is relayed to the backend as-is; the locale only affects
/// display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    session: SessionContext,
    locale: Locale,
}

impl RequestContext {
    pub fn new(session: SessionContext, locale: Locale) -> Self {
        Self { session, locale }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}
