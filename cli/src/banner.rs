extern crate colored;
use colored::*;

// hand-lettered, one color per letter of the name
#[rustfmt::skip]
pub fn print_banner() {
    println!("{}{}{}{}{}",  "       __      __".red().bold(),  "          ".yellow().bold(), "   .__     ".green().bold(),  "                 ".cyan().bold(),  "            ".blue().bold());
    println!("{}{}{}{}{}",  "      |__|__ __|  | __".red().bold(), "____  ".yellow().bold(), " ______|  |__ ".green().bold(), "_____ _______ ".cyan().bold(), " ____  ".blue().bold());
    println!("{}{}{}{}{}",  "      |  |  |  \\  |/ /".red().bold(), "/ __ \\ ".yellow().bold(), "/  ___/  |  \\".green().bold(), "\\__  \\\\_  __ \\".cyan().bold(), "/ __ \\ ".blue().bold());
    println!("{}{}{}{}{}",  "      |  |  |  /    <".red().bold(), "\\  ___/ ".yellow().bold(), "\\___ \\|   Y  \\".green().bold(), "/ __ \\|  | \\/".cyan().bold(), "\\  ___/ ".blue().bold());
    println!("{}{}{}{}{}",  "  /\\__|  |____/|__|_ \\".red().bold(), "\\___  >".yellow().bold(), "____  >___|  /".green().bold(), "(____  /__|   ".cyan().bold(), " \\___  >".blue().bold());
    println!("{}{}{}{}{}",  "  \\______|          \\/".red().bold(), "    \\/ ".yellow().bold(), "    \\/     \\/ ".green().bold(), "     \\/       ".cyan().bold(), "     \\/ ".blue().bold());
}
