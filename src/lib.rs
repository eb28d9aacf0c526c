pub mod config;
pub mod error;
pub mod model;
pub mod recognizer;
pub mod selection;
pub mod types;

pub use config::SelectorConfig;
pub use error::RecognitionError;
pub use model::hmm::GaussianHmm;
pub use model::trainer::SegmentalTrainer;
pub use recognizer::Recognizer;
pub use selection::traits::{ModelTrainer, WordModel};
pub use selection::{Criterion, Selector};
pub use types::{combine_sequences, FeatureMatrix, Recognition, ScoreTable, TrainingData};
