mod bins;
mod client;
mod controller;
mod labeled;
mod response;
#[cfg(test)]
mod tests;

pub use bins::BinKind;
pub use client::{ClassificationClient, HttpClassificationClient, IMAGE_FIELD};
pub use controller::{
    ClassificationController, ClassificationFailure, Completion, RequestState, RequestStatus,
    RequestTicket,
};
pub use labeled::LabeledImage;
pub use response::{interpret_response, ClassificationResult};
