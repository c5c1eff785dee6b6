/// Scripted remover for tests
///
/// Emits a fixed sequence of progress fractions, then succeeds with
/// recognizable bytes or fails for filenames it was told to reject.
/// Lets batch tests replay callback timing deterministically.

use std::collections::HashSet;

use async_stream::stream;
use futures::StreamExt;

use super::{BackgroundRemover, RemovalError, RemovalStream, RemovalUpdate};

pub struct MockRemover {
    steps: Vec<f32>,
    failing: HashSet<String>,
}

impl MockRemover {
    /// Remover that succeeds for every file
    pub fn succeeding(steps: Vec<f32>) -> Self {
        Self {
            steps,
            failing: HashSet::new(),
        }
    }

    /// Remover that fails for the named files and succeeds otherwise
    pub fn failing_on(names: &[&str], steps: Vec<f32>) -> Self {
        Self {
            steps,
            failing: names.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// The bytes a successful mock removal produces for `filename`
    pub fn output_for(filename: &str) -> Vec<u8> {
        format!("cutout:{}", filename).into_bytes()
    }
}

impl BackgroundRemover for MockRemover {
    fn remove_background(&self, _image: Vec<u8>, filename: &str) -> RemovalStream {
        let steps = self.steps.clone();
        let fails = self.failing.contains(filename);
        let name = filename.to_string();

        let updates = stream! {
            for step in steps {
                yield RemovalUpdate::Progress(step);
            }
            if fails {
                yield RemovalUpdate::Done(Err(RemovalError::Service {
                    status: 500,
                    detail: format!("mock failure for {}", name),
                }));
            } else {
                yield RemovalUpdate::Done(Ok(MockRemover::output_for(&name)));
            }
        };

        updates.boxed()
    }
}
