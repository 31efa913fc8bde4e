mod client;
mod prompt;
mod services;

pub use client::{GeminiClient, NutritionModel};
pub use prompt::{build_prompt, PortionSize};
pub use services::{analyze, encode_png_blocking, prepare_image, AnalysisOutcome, Upload};

#[cfg(test)]
pub(crate) use services::tests::{tiny_jpeg, tiny_png, FakeModel};
