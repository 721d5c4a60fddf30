//! Run the full analysis over two small in-memory books.
//!
//! ```sh
//! RUST_LOG=authorship_analyzer=debug cargo run --example pipeline
//! ```

use anyhow::Result;

use authorship_analyzer::classifier::log_space;
use authorship_analyzer::{MemorySource, Pipeline, PipelineConfig};

const PARLOUR: &str = "\
It is a truth universally acknowledged that a single man in possession of a good fortune must be in want of a wife
My dear Mr Bennet said his lady to him one day have you heard that Netherfield Park is let at last
Mr Bennet replied that he had not but his lady returned that it was for Mrs Long had just been here
Her sister Jane was the most beautiful creature she ever beheld and her manners were easy and pleasing
The ballroom at Netherfield was full when Mr Bingley arrived with his sisters and Mr Darcy
Mr Darcy soon drew the attention of the room by his fine tall person and noble mien
Elizabeth wrote a letter to her sister Jane about the carriage and the dinner at Rosings
Lady Catherine received them in the drawing room with an air of great condescension
";

const VOYAGE: &str = "\
You will rejoice to hear that no disaster has accompanied the commencement of an enterprise
I am already far north of London and as I walk in the streets of Petersburg I feel a cold northern breeze
The ship was surrounded by ice and the sailors gazed upon the frozen sea with anxious eyes
I have no friend on the ocean and the captain of the vessel is a man of gentle manners
The storm raged all night and the waves rose high above the deck of the ship
At length the wretched creature fled across the ice toward the mountains of the north
The crew demanded that the captain turn the ship southward if the ice should dissipate
I saw the creature upon the ice drawn by dogs and the sledge passed at a great distance
";

fn book(text: &str, repeat: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    (0..repeat).flat_map(|_| lines.iter().map(|l| l.to_string())).collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("authorship_analyzer=info")),
        )
        .init();

    let mut source = MemorySource::new();
    source
        .insert(1342, "Pride and Prejudice", book(PARLOUR, 12))
        .insert(84, "Frankenstein", book(VOYAGE, 12));

    let mut config = PipelineConfig::default();
    config.classifier.cs = log_space(-2.0, 2.0, 5);
    config.classifier.folds = 3;
    config.collocation.min_count = 3;
    config.topic.lda.n_topics = 3;

    let report = Pipeline::new(config)?.run(&source)?;
    println!("{report}");
    Ok(())
}
