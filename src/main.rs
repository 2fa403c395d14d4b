//! Lesson Engine CLI
//!
//! Usage:
//!   lesson_engine --serve                              # HTTP API server
//!   lesson_engine --play --goal "learn marketing"      # Play in the terminal
//!   lesson_engine --play --goal "..." --json           # JSON lines output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use lesson_engine::config::{AppConfig, DEFAULT_TIMEOUT_SECS};
use lesson_engine::core::{
    run_server, ContentGenerator, DashboardView, LessonView, Session, SessionCommand, SessionOutput,
};
use lesson_engine::core::gemini::DEFAULT_MODEL;
use lesson_engine::types::{PetKind, Phase, QuestionType, QuizOutcome, Timer, UserProfile};
use lesson_engine::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "lesson_engine",
    version = VERSION,
    about = "Gamified lessons: theory, quizzes, hearts, badges and a companion to feed",
    long_about = "Lesson Engine turns a learning goal into a course of short lessons.\n\n\
                  Each lesson is a theory passage and a quiz. Two wrong answers end\n\
                  the attempt. Finished lessons unlock the next one and earn food\n\
                  for your companion, which grows every five feeds.\n\n\
                  Modes:\n  \
                  --serve  HTTP API server mode\n  \
                  --play   Terminal mode"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Play one session in the terminal
    #[arg(short, long)]
    play: bool,

    /// Learning goal (asked for interactively when missing)
    #[arg(short, long)]
    goal: Option<String>,

    /// Your background, used to adapt generated lessons
    #[arg(short, long, default_value = "")]
    background: String,

    /// Companion species
    #[arg(long, value_enum, default_value = "dog")]
    pet: Pet,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for generation
    #[arg(long, env = "LESSON_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Generator request timeout
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Seed for reproducible matching layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Pet {
    Dog,
    Cat,
}

impl From<Pet> for PetKind {
    fn from(pet: Pet) -> Self {
        match pet {
            Pet::Dog => PetKind::Dog,
            Pet::Cat => PetKind::Cat,
        }
    }
}

impl Args {
    fn config(&self) -> AppConfig {
        AppConfig {
            addr: self.addr.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            seed: self.seed,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    if args.serve {
        run_serve(&args).await;
    } else {
        run_play(&args).await;
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args) {
    if let Err(e) = run_server(args.config()).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// TERMINAL RUNNER
// =============================================================================

/// Timers waiting for their deadline; fired between prompts
#[derive(Default)]
struct TimerQueue {
    pending: Vec<(Instant, Timer)>,
}

impl TimerQueue {
    fn push_all(&mut self, timers: &[Timer]) {
        let now = Instant::now();
        self.pending.extend(timers.iter().map(|t| (now + t.delay(), *t)));
    }

    fn fire_due(&mut self, session: &mut Session) {
        let now = Instant::now();
        let (due, later): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = later;
        for (_, timer) in due {
            session.fire(timer);
        }
    }
}

struct Runner {
    session: Session,
    generator: ContentGenerator,
    timers: TimerQueue,
    json: bool,
    last_activity: Instant,
}

impl Runner {
    fn record(&mut self, out: &SessionOutput) {
        self.timers.push_all(&out.timers);
        if self.json {
            println!("{}", serde_json::to_string(out).unwrap_or_default());
        }
    }

    /// Read one trimmed line; None on EOF
    fn prompt(&mut self, label: &str) -> Option<String> {
        self.timers.fire_due(&mut self.session);
        print!("{} ", label.cyan().bold());
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let idle = self.last_activity.elapsed();
                self.last_activity = Instant::now();
                self.session.observe_idle(idle);
                self.timers.fire_due(&mut self.session);
                Some(line.trim().to_string())
            }
        }
    }

    fn apply(&mut self, command: SessionCommand) -> SessionOutput {
        let out = self.session.apply(command);
        self.record(&out);
        out
    }
}

/// Play one session in the terminal
async fn run_play(args: &Args) {
    let config = args.config();
    let generator = match config.content_generator() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mut runner = Runner {
        session: Session::new(config.shuffler()),
        generator,
        timers: TimerQueue::default(),
        json: args.json,
        last_activity: Instant::now(),
    };

    print_header();

    let goal = match &args.goal {
        Some(goal) => goal.clone(),
        None => match runner.prompt("What do you want to learn?") {
            Some(goal) if !goal.is_empty() => goal,
            _ => return,
        },
    };
    let profile = UserProfile {
        goal,
        background: args.background.clone(),
        pet_preference: args.pet.into(),
    };
    let out = runner.session.set_profile(profile);
    runner.record(&out);

    if !load_course(&mut runner).await {
        return;
    }

    loop {
        print_dashboard(&DashboardView::of(&runner.session));
        let Some(line) = runner.prompt("[#] open lesson, [f]eed, [n]ew course, [q]uit >") else {
            break;
        };
        match line.as_str() {
            "q" | "quit" | "exit" => break,
            "f" | "feed" => {
                let out = runner.apply(SessionCommand::Feed);
                print_feed(&out);
            }
            "n" | "new" => {
                let out = runner.apply(SessionCommand::ClearCourse);
                println!("{}", out.reason.description().dimmed());
                if !load_course(&mut runner).await {
                    break;
                }
            }
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => play_lesson(&mut runner, n - 1).await,
                _ => println!("{}", "Unknown choice".yellow()),
            },
        }
    }

    let ledger = runner.session.ledger();
    println!(
        "\nSession ended. Lessons: {} | Badges: {} | Companion: {}",
        ledger.completed_count(),
        ledger.badges.len(),
        ledger.mascot_level.stage_name()
    );
}

async fn load_course(runner: &mut Runner) -> bool {
    let job = match runner.session.begin_course_request() {
        Ok(job) => job,
        Err(reason) => {
            println!("{}", reason.description().red());
            return false;
        }
    };
    println!("{}", "Building your course...".dimmed());
    let result = runner.generator.generate_course_outline(&job.profile).await;
    let out = runner.session.finish_course_request(job.ticket, result);
    runner.record(&out);
    if runner.session.course().is_none() {
        println!("{}", out.reason.description().red());
        return false;
    }
    true
}

async fn play_lesson(runner: &mut Runner, index: usize) {
    let Some(lesson_id) = runner
        .session
        .course()
        .and_then(|c| c.lessons().nth(index))
        .map(|l| l.id.clone())
    else {
        println!("{}", "No such lesson".yellow());
        return;
    };

    let job = match runner.session.begin_lesson_request(&lesson_id) {
        Ok(job) => job,
        Err(reason) => {
            println!("{}", reason.description().yellow());
            return;
        }
    };
    println!("{}", "Loading lesson...".dimmed());
    let result = runner
        .generator
        .generate_lesson_content(&job.topic, &job.lesson, job.profile.as_ref())
        .await;
    let out = runner.session.finish_lesson_request(job.ticket, &lesson_id, result);
    runner.record(&out);
    if runner.session.active_lesson().is_none() {
        println!("{}", out.reason.description().red());
        return;
    }

    while let Some(view) = runner.session.active_lesson().map(LessonView::of) {
        if view.outcome == QuizOutcome::Failed {
            println!("\n{}", "Out of hearts! This attempt is over.".red().bold());
            runner.prompt("Press Enter to return to the course >");
            runner.apply(SessionCommand::ExitLesson);
            return;
        }
        let out = match view.phase {
            Phase::Theory => {
                println!("\n{}\n\n{}\n", view.title.bold(), view.theory);
                match runner.prompt("Press Enter to start the quiz (or 'x' to exit) >") {
                    Some(l) if l != "x" => runner.apply(SessionCommand::StartQuiz),
                    _ => runner.apply(SessionCommand::ExitLesson),
                }
            }
            Phase::Quiz if view.status.is_resolved() => {
                print_feedback(&view);
                if runner.prompt("Press Enter to continue >").is_none() {
                    runner.apply(SessionCommand::ExitLesson);
                    return;
                }
                runner.apply(SessionCommand::Advance)
            }
            Phase::Quiz => {
                let Some(command) = ask_question(runner, &view) else {
                    runner.apply(SessionCommand::ExitLesson);
                    return;
                };
                runner.apply(command)
            }
        };
        if let Some(quiz) = &out.quiz {
            if !runner.json {
                println!("{}", quiz.to_terminal_string());
            }
        }
        if let Some(completion) = &out.completion {
            println!("\n{} {}", "Lesson complete!".green().bold(), "+2 🦴".yellow());
            if let Some(next) = &completion.unlocked_lesson_id {
                println!("{} {}", "Unlocked:".dimmed(), next.dimmed());
            }
            if let Some(badge) = &out.badge {
                println!("{} {} {}", badge.icon, "Badge unlocked:".magenta().bold(), badge.name);
            }
        }
    }
}

/// Turn one line of input into a command for the current question
fn ask_question(runner: &mut Runner, view: &LessonView) -> Option<SessionCommand> {
    let question = view.question.as_ref()?;
    let hearts = "♥".repeat(view.hearts as usize);
    println!(
        "\n{} {}/{}  {}",
        hearts.red(),
        view.current_index + 1,
        view.question_count,
        question.prompt.bold()
    );

    if question.kind == QuestionType::Matching {
        let board = view.board.as_ref()?;
        for (i, (left, right)) in board.left_terms.iter().zip(&board.right_terms).enumerate() {
            let done_l = board.matched.iter().any(|p| &p.left == left);
            let done_r = board.matched.iter().any(|p| &p.right == right);
            let fmt = |term: &str, done: bool| if done { term.green().to_string() } else { term.to_string() };
            println!("  {}. {:<30} {}. {}", i + 1, fmt(left, done_l), i + 1, fmt(right, done_r));
        }
        if let Some(shake) = &board.shake {
            println!("  {} {}", "✗".red(), shake.red());
        }
        let line = runner.prompt("Pair as 'left right' (e.g. 1 3) >")?;
        let mut nums = line.split_whitespace().filter_map(|n| n.parse::<usize>().ok());
        let (l, r) = (nums.next()?, nums.next()?);
        let left = board.left_terms.get(l.checked_sub(1)?)?.clone();
        let right = board.right_terms.get(r.checked_sub(1)?)?.clone();
        runner.apply(SessionCommand::SelectLeft { term: left });
        return Some(SessionCommand::SelectRight { term: right });
    }

    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
    let line = runner.prompt("Your answer >")?;
    let option = line
        .parse::<usize>()
        .ok()
        .and_then(|n| question.options.get(n.checked_sub(1)?))
        .cloned()
        .unwrap_or(line);
    runner.apply(SessionCommand::SelectOption { option });
    Some(SessionCommand::Submit)
}

// =============================================================================
// PRINTING
// =============================================================================

fn print_header() {
    println!("{}", "═".repeat(60).dimmed());
    println!("  {} v{}", "Lesson Engine".bold(), VERSION);
    println!("{}", "═".repeat(60).dimmed());
}

fn print_dashboard(view: &DashboardView) {
    let Some(course) = &view.course else {
        return;
    };
    println!("\n{} {}%", course.topic.bold(), view.course_progress);
    let mut n = 0;
    for unit in &course.units {
        println!("  {}", unit.title.underline());
        for lesson in &unit.lessons {
            n += 1;
            let mark = if view.ledger.has_completed(&lesson.id) {
                "✓".green()
            } else if lesson.is_locked {
                "🔒".normal()
            } else {
                "▶".cyan()
            };
            println!("    {:>2}. {} {}", n, mark, lesson.title);
        }
    }
    println!(
        "  🦴 {}  ⭐ {}  🔥 {}  {} lvl {} ({}%)  [{}] {}",
        view.ledger.food,
        view.ledger.xp,
        view.ledger.streak,
        view.mascot_stage,
        view.ledger.mascot_level.number(),
        view.level_progress,
        view.mood,
        view.bubble_text.italic()
    );
    if let Some(badge) = &view.new_badge {
        println!("  {} {} {}", badge.icon, "New badge:".magenta(), badge.name);
    }
}

fn print_feed(out: &SessionOutput) {
    let Some(feed) = &out.feed else {
        return;
    };
    if feed.reason.fed() {
        println!("{} ({} left, {}/5)", "Yum!".green(), feed.food, feed.food_eaten_progress);
    } else {
        println!("{}", feed.reason.description().yellow());
    }
    if feed.leveled_up() {
        println!("{} {}", "Level up!".yellow().bold(), feed.level.stage_name());
    }
}

fn print_feedback(view: &LessonView) {
    let Some(question) = &view.question else {
        return;
    };
    match view.status {
        lesson_engine::types::AttemptStatus::Correct => println!("{}", "Correct!".green().bold()),
        _ => println!("{}", "Not quite.".red().bold()),
    }
    if let Some(answer) = &view.revealed_answer {
        println!("{} {}", "Answer:".dimmed(), answer);
    }
    if let Some(explanation) = &question.explanation {
        println!("{}", explanation.italic());
    }
}
