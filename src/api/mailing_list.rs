//! `POST /api/mailchimp`: pass a signup through to the mailing list.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::error::SiteResult;
use crate::http::response::Reply;
use crate::security::csrf::CRUMB_FIELD;
use crate::upstream::{MailingList, UpstreamReply};

/// Forward the payload and hand back whatever the list service answered.
pub async fn subscribe(list: &dyn MailingList, mut payload: Map<String, Value>) -> SiteResult<Reply> {
    payload.remove(CRUMB_FIELD);
    let reply = list.subscribe(payload).await?;
    Ok(Reply::Delegate(upstream_response(reply)))
}

/// Rebuild an upstream reply as our response, status and body untouched.
pub fn upstream_response(reply: UpstreamReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Body::from(reply.body)).into_response();
    if let Some(ct) = reply
        .content_type
        .and_then(|ct| header::HeaderValue::try_from(ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, ct);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MailingListError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingList {
        seen: Mutex<Vec<Map<String, Value>>>,
    }

    #[async_trait]
    impl MailingList for CapturingList {
        async fn subscribe(&self, payload: Map<String, Value>) -> Result<UpstreamReply, MailingListError> {
            self.seen.lock().unwrap().push(payload);
            Ok(UpstreamReply {
                status: 400,
                content_type: Some("application/problem+json".into()),
                body: Bytes::from_static(br#"{"title":"Member Exists"}"#),
            })
        }
    }

    #[tokio::test]
    async fn test_forwards_without_crumb_and_returns_reply_verbatim() {
        let list = CapturingList::default();
        let mut payload = Map::new();
        payload.insert("email".into(), Value::String("a@b.co".into()));
        payload.insert("crumb".into(), Value::String("tok".into()));

        let reply = subscribe(&list, payload).await.unwrap();
        let response = match reply {
            Reply::Delegate(r) => r,
            _ => panic!("expected delegate reply"),
        };

        let seen = list.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].get("crumb").is_none());
        assert_eq!(seen[0]["email"], "a@b.co");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"title":"Member Exists"}"#);
    }

    #[test]
    fn test_bogus_upstream_status() {
        let response = upstream_response(UpstreamReply {
            status: 1000,
            content_type: None,
            body: Bytes::new(),
        });
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
