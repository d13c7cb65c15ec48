//! Deprecated method names.
//!
//! Older call sites keep working: each alias logs a warning naming its
//! replacement and forwards to it.

use crate::api::{CoreApi, DiscussionsApi, TaskApi};
use crate::content::MessageContent;
use crate::error::Result;
use crate::http::{Query, RequestBody, Response};

fn warn_deprecated(old: &str, new: &str) {
    tracing::warn!("{} is deprecated, use {} instead", old, new);
}

impl CoreApi {
    #[deprecated(since = "0.1.0", note = "use `core().kapps().list()`")]
    pub async fn find_kapps(&self, query: &Query) -> Result<Response> {
        warn_deprecated("CoreApi::find_kapps", "kapps().list()");
        self.kapps().list(query).await
    }

    #[deprecated(since = "0.1.0", note = "use `core().kapps().get()`")]
    pub async fn find_kapp(&self, slug: &str, query: &Query) -> Result<Response> {
        warn_deprecated("CoreApi::find_kapp", "kapps().get()");
        self.kapps().get(slug, query).await
    }

    #[deprecated(since = "0.1.0", note = "use `core().submissions().search_form()`")]
    pub async fn find_form_submissions(
        &self,
        kapp: &str,
        form: &str,
        query: &Query,
    ) -> Result<Response> {
        warn_deprecated("CoreApi::find_form_submissions", "submissions().search_form()");
        self.submissions().search_form(kapp, form, query).await
    }

    #[deprecated(since = "0.1.0", note = "use `core().submissions().create()`")]
    pub async fn add_submission(
        &self,
        kapp: &str,
        form: &str,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        warn_deprecated("CoreApi::add_submission", "submissions().create()");
        self.submissions()
            .create(kapp, form, body, &Query::new())
            .await
    }
}

impl TaskApi {
    #[deprecated(since = "0.1.0", note = "use `task().engine().start()`")]
    pub async fn start_engine(&self) -> Result<Response> {
        warn_deprecated("TaskApi::start_engine", "engine().start()");
        self.engine().start().await
    }

    #[deprecated(since = "0.1.0", note = "use `task().engine().stop()`")]
    pub async fn stop_engine(&self) -> Result<Response> {
        warn_deprecated("TaskApi::stop_engine", "engine().stop()");
        self.engine().stop().await
    }
}

impl DiscussionsApi {
    #[deprecated(since = "0.1.0", note = "use `discussions().messages(id).add()`")]
    pub async fn add_message(
        &self,
        discussion_id: &str,
        content: impl Into<MessageContent>,
    ) -> Result<Response> {
        warn_deprecated("DiscussionsApi::add_message", "messages(id).add()");
        self.messages(discussion_id).add(content).await
    }
}
