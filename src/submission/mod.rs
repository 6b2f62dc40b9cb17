pub mod client;
pub mod multipart;

pub use client::{
    build_form, submit, SubmissionClient, SubmissionResult, TrainingPayload, Transport,
    TransportResponse, UreqTransport,
};
pub use multipart::MultipartForm;
