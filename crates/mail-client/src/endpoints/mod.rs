//! Request descriptors for the backend's endpoints
//!
//! Builders only describe requests; `AuthenticatedClient::execute` runs them.
//! Payloads other than the auth types stay opaque JSON.

pub mod alias;
pub mod attachment;
pub mod auth;
pub mod email;
pub mod password;
pub mod user;

use transport::RequestDescriptor;

/// Paging parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl Page {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    fn apply(self, descriptor: RequestDescriptor) -> RequestDescriptor {
        descriptor
            .query_opt("page", self.page)
            .query_opt("size", self.size)
    }
}
