use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use trivia_api::client::{QuizClient, QuizRun, QUIZ_LENGTH};
use trivia_api::utils::logger;

#[derive(Parser)]
#[command(name = "play_quiz")]
#[command(about = "Play a trivia quiz against a running trivia-api server")]
struct Args {
    /// Base URL of the trivia server
    #[arg(short, long, default_value = "http://127.0.0.1:5000/")]
    server: String,

    /// Category id to draw questions from (all categories when omitted)
    #[arg(short, long)]
    category: Option<i64>,

    #[arg(short, long, default_value_t = QUIZ_LENGTH)]
    max_questions: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let client = QuizClient::new(&args.server).context("invalid server URL")?;

    let categories = client
        .categories()
        .await
        .context("failed to load categories")?;
    let category_name = match args.category {
        Some(id) => categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.kind.clone())
            .with_context(|| format!("category {} does not exist", id))?,
        None => "All".to_string(),
    };

    println!("🎲 Quiz: {} ({} questions max)", category_name, args.max_questions);

    let mut run = QuizRun::new(args.category, args.max_questions);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(question) = run.next_question(&client).await? {
        println!("\nQ{}: {}", run.asked(), question.question);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let answer = line?;

        if run.record_answer(&question, &answer) {
            println!("✅ Correct!");
        } else {
            println!("❌ The answer was: {}", question.answer);
        }
    }

    println!(
        "\n📊 Score: {}/{} correct",
        run.correct(),
        run.asked()
    );
    Ok(())
}
