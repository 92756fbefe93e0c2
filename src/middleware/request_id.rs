use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

pub const REQUEST_ID_LEN: usize = 16;

/// 16 random alphanumeric characters.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeShortRequestId;

impl MakeRequestId for MakeShortRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id[..REQUEST_ID_LEN]).ok().map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_short_and_alphanumeric() {
        let req = Request::new(());
        let id = MakeShortRequestId.make_request_id(&req).unwrap();
        let id = id.header_value().to_str().unwrap().to_string();
        assert_eq!(id.len(), REQUEST_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
