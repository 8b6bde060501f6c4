use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use mindease_application::AppContext;

pub fn run(home: Option<&Path>) -> Result<()> {
    let ctx = AppContext::load(home, true)?;
    let (path, created) = ctx.init_secret_file()?;

    if created {
        println!("{}", format!("Created {}", path.display()).green());
        println!(
            "{}",
            "Add your Gemini API key to it, or set GEMINI_API_KEY.".bright_black()
        );
    } else {
        println!("{}", format!("{} already exists", path.display()).bright_black());
    }
    Ok(())
}
