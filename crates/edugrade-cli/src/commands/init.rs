//! The `edugrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("edugrade.toml").exists() {
        println!("edugrade.toml already exists, skipping.");
    } else {
        std::fs::write("edugrade.toml", SAMPLE_CONFIG)?;
        println!("Created edugrade.toml");
    }

    std::fs::create_dir_all("assignments")?;
    let example_path = std::path::Path::new("assignments/example.toml");
    if example_path.exists() {
        println!("assignments/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ASSIGNMENT_SET)?;
        println!("Created assignments/example.toml");
    }

    std::fs::create_dir_all("submissions")?;

    println!("\nNext steps:");
    println!("  1. Run: edugrade validate --assignments assignments/example.toml");
    println!("  2. Put learner answers in submissions/<assignment id>.html or .txt");
    println!("  3. Run: edugrade check --assignments assignments --submissions submissions");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# edugrade configuration

# Language of grader messages: ru, kz or en
default_language = "ru"
parallelism = 4
output_dir = "./edugrade-results"
progress_file = "./edugrade-progress.json"

# Optional phrase table replacing the builtin one:
# phrase_file = "${HOME}/edugrade/phrases.toml"
"#;

const EXAMPLE_ASSIGNMENT_SET: &str = r#"[assignment_set]
id = "example"
name = "Example Assignment Set"
description = "A couple of assignments to get started"
course_id = "web-basics"
default_language = "ru"

[[assignments]]
id = "first-heading"
title = "First heading"
description = "Create a level one heading greeting the world"
module_id = "html-intro"
kind = "html"
expected = "<h1>Привет мир</h1>"
tags = ["html", "basics"]

[[assignments]]
id = "paragraph-list"
title = "Paragraph and list"
description = "Write a paragraph followed by a two item list"
module_id = "html-intro"
kind = "html"
expected = """
<p>Мои языки:</p>
<ul>
  <li>Русский</li>
  <li>Қазақша</li>
</ul>
"""
tags = ["html", "lists"]

[[assignments]]
id = "console-greeting"
title = "Console greeting"
description = "Print a greeting to the console"
module_id = "js-intro"
kind = "console"
expected = "Привет мир"
language = "kz"
tags = ["console", "basics"]
"#;
