pub mod controller;
pub mod export;
pub mod generator;
pub mod options;
pub mod reader;

pub use controller::StampController;
pub use export::Exporter;
pub use generator::CommandGenerator;
pub use options::Options;
pub use reader::ImageReader;
