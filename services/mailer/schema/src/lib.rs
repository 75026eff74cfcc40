pub mod campaigns;
pub mod recipients;
