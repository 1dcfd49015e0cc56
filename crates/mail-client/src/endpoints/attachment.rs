//! `/attachments` endpoints

use transport::RequestDescriptor;

/// Raw file download; the body is handed back undecoded.
pub fn download(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/attachments/{id}/download")).binary()
}

pub fn view(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/attachments/{id}/view"))
}

pub fn info(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/attachments/{id}"))
}

pub fn delete(id: u64) -> RequestDescriptor {
    RequestDescriptor::delete(format!("/attachments/{id}"))
}

pub fn preview(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/attachments/{id}/preview"))
}

pub fn for_email(email_id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/attachments/email/{email_id}"))
}

pub fn scan(id: u64) -> RequestDescriptor {
    RequestDescriptor::post(format!("/attachments/{id}/scan"))
}
