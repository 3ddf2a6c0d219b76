//! The `readex init` command.

use anyhow::Result;

use readex_bank::DEFAULT_CONFIG_FILE;

pub fn execute() -> Result<()> {
    // Create readex.toml
    if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
        println!("{DEFAULT_CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(DEFAULT_CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {DEFAULT_CONFIG_FILE}");
    }

    // Create example banks
    std::fs::create_dir_all("data")?;
    for (path, contents) in [
        ("data/passages.json", EXAMPLE_BANK),
        ("data/passages_q9.json", EXAMPLE_SUPPLEMENTARY),
    ] {
        if std::path::Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, contents)?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Run: readex validate --bank data/passages.json");
    println!("  2. Run: readex inspect --seed 42 --shuffled");
    println!("  3. Run: readex grade --answers answers.json --seed 42");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# readex configuration

passages_path = "data/passages.json"
supplementary_path = "data/passages_q9.json"
# answer_keys_path = "data/answer_keys.json"
default_minutes = 20
"#;

const EXAMPLE_BANK: &str = r#"{
  "passages": [
    {
      "id": "1",
      "title": "The Printing Press",
      "content": "Before movable type reached Europe, books were copied by hand, a process so slow that a single volume could occupy a scribe for months. The press changed the economics of knowledge within a generation: print shops spread along trade routes, and the price of a book fell to a fraction of its former cost.",
      "questions": [
        {
          "id": "1-1",
          "stem": "According to the passage, hand copying was slow because",
          "choices": [
            "scribes refused to work quickly",
            "a single volume could occupy a scribe for months",
            "trade routes were unreliable",
            "paper was scarce"
          ],
          "correct_index": 1
        },
        {
          "id": "1-2",
          "stem": "The word \"fraction\" in the passage is closest in meaning to",
          "choices": ["multiple", "small part", "estimate", "measure"],
          "correct_index": 1,
          "explanation": "A fraction of the former cost means a small part of it."
        }
      ]
    }
  ]
}
"#;

const EXAMPLE_SUPPLEMENTARY: &str = r#"{
  "passages": [
    {
      "passage_id": "1",
      "questions": [
        {
          "id": "1-9",
          "stem": "Why does the author mention trade routes?",
          "choices": [
            "To explain how print shops spread",
            "To argue that scribes travelled widely",
            "To question the press's importance",
            "To describe how paper was made"
          ],
          "correct_index": 0
        }
      ]
    }
  ]
}
"#;
