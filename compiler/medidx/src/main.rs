use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use medi_ai::{
    aggregate, best_by_f1, render_report, AlgorithmBench, MetricRecord, Outcome, PredictError,
    Predictor, ReportKind, Session,
};
use medi_data::split::DEFAULT_TEST_FRACTION;
use medi_data::{
    AccountStore, AuthError, Dataset, DiseaseProfile, DiseaseRegistry, InputVector, Number,
};
use medi_model::{Algorithm, ClassifierRegistry, ModelArtifact, ModelError, TrainingSet};

pub mod config;

use config::{Config, Overrides};

#[derive(Debug, Parser)]
#[command(
    name = "medidx",
    version,
    author = "MediLang Team",
    about = "Multi-disease screening: range checks, predictions, model benchmarks and a health assistant",
    long_about = "medidx screens for diabetes, heart disease, Parkinson's, liver disease and\n\
        breast cancer with classical classifiers trained on public datasets.\n\n\
        Results are screening guidance, not a diagnosis.\n\n\
        EXAMPLES:\n\
        \n  medidx diseases --ranges                     List diseases and input ranges\n\
        \n  medidx train diabetes --algorithm svm        Fit and save a model\n\
        \n  medidx predict diabetes Glucose=148 Age=50 ...  Validate and predict\n\
        \n  medidx bench                                 Compare algorithms on every dataset\n\
        \n  medidx chat                                  Talk to the assistant",
    after_help = "Paths can also be set with MEDIDX_CONFIG, MEDIDX_DATA_DIR, MEDIDX_MODEL_DIR,\n\
        MEDIDX_ACCOUNTS, MEDIDX_SESSION and MEDIDX_SEED."
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct PathArgs {
    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory with the disease CSV datasets
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Directory with trained model artifacts
    #[arg(long, value_name = "DIR", global = true)]
    model_dir: Option<PathBuf>,

    /// Directory with the account table
    #[arg(long, value_name = "DIR", global = true)]
    accounts: Option<PathBuf>,

    /// Session file (signed-in user and chat history)
    #[arg(long, value_name = "FILE", global = true)]
    session: Option<PathBuf>,

    /// Seed for data splits and randomized learners
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl PathArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            model_dir: self.model_dir.clone(),
            account_dir: self.accounts.clone(),
            session_file: self.session.clone(),
            seed: self.seed,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the diseases that can be screened
    Diseases(DiseasesArgs),
    /// Check inputs against a disease's clinical ranges
    Validate(InputArgs),
    /// Validate inputs and predict with the disease's trained model
    Predict(PredictArgs),
    /// Fit one algorithm on a disease dataset and save the model artifact
    Train(TrainArgs),
    /// Compare the algorithm panel on one disease dataset, or on all of them
    Bench(BenchArgs),
    /// Chat with the health assistant
    #[command(
        about = "Chat with the health assistant",
        long_about = "Start an interactive chat with the rule-based health assistant.\n\n\
            Commands:\n\
            \n  :history  Show the conversation so far\n\
            \n  :clear    Forget the conversation\n\
            \n  :quit     Leave the chat (also :q, :exit)"
    )]
    Chat(ChatArgs),
    /// Register, log in or log out
    Account(AccountArgs),
    /// Predict and save a result report for the signed-in user
    Report(ReportArgs),
}

#[derive(Debug, Args)]
struct DiseasesArgs {
    /// Show the accepted range of every checked input
    #[arg(long)]
    ranges: bool,
}

#[derive(Debug, Args, Clone)]
struct InputArgs {
    /// Disease key or title (e.g. diabetes, "Heart Disease Prediction")
    disease: String,

    /// Input values
    #[arg(value_name = "NAME=VALUE", value_parser = parse_input)]
    values: Vec<(String, Number)>,

    /// JSON object of inputs; NAME=VALUE pairs override its entries
    #[arg(long, value_name = "FILE")]
    inputs: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PredictArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Also save a result report (requires a signed-in user)
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ReportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Report file; the extension is added when missing
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// Disease key or title
    disease: String,

    /// random-forest, logistic-regression, svm, decision-tree, knn or nearest-centroid
    #[arg(short, long, default_value = "random-forest")]
    algorithm: Algorithm,
}

#[derive(Debug, Args)]
struct BenchArgs {
    /// Disease key or title; all diseases when omitted
    disease: Option<String>,

    /// Share of rows held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ChatArgs {
    /// Place used when asking for nearby hospitals
    #[arg(long)]
    location: Option<String>,

    /// Send these messages and exit instead of starting an interactive chat
    #[arg(short, long = "message", value_name = "TEXT")]
    messages: Vec<String>,
}

#[derive(Debug, Args)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Debug, Subcommand)]
enum AccountCommand {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long = "confirm-password")]
        confirm: String,
    },
    /// Sign in and remember the user in the session file
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the chat history
    Logout,
}

fn parse_input(s: &str) -> Result<(String, Number), String> {
    let (name, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing input name in '{s}'"));
    }
    let value =
        Number::parse(value).ok_or_else(|| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn find_profile<'a>(diseases: &'a DiseaseRegistry, name: &str) -> Result<&'a DiseaseProfile, i32> {
    diseases.find(name).ok_or_else(|| {
        eprintln!("error: unknown disease '{name}'");
        eprintln!("hint: run 'medidx diseases' to list them");
        2
    })
}

fn collect_inputs(args: &InputArgs) -> Result<InputVector, i32> {
    let mut input = match &args.inputs {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                eprintln!("error: failed to read '{}': {e}", path.display());
                2
            })?;
            serde_json::from_str::<InputVector>(&text).map_err(|e| {
                eprintln!("error: '{}' is not a JSON object of inputs: {e}", path.display());
                2
            })?
        }
        None => InputVector::new(),
    };
    for (name, value) in &args.values {
        input.insert(name.clone(), *value);
    }
    Ok(input)
}

fn load_session(config: &Config) -> Result<Session, i32> {
    Session::load(&config.session_file).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn save_session(config: &Config, session: &Session) -> Result<(), i32> {
    session.save(&config.session_file).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn open_accounts(config: &Config) -> Result<AccountStore, i32> {
    AccountStore::open(&config.account_dir).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

/// E-mail of the signed-in user; reports are only issued to one.
fn requester(config: &Config) -> Result<String, i32> {
    let session = load_session(config)?;
    session.requester().map(str::to_string).ok_or_else(|| {
        eprintln!("error: please log in to download a report");
        eprintln!("hint: medidx account login --email <EMAIL> --password <PASSWORD>");
        2
    })
}

/// A registry holding the disease's artifact, or nothing when it cannot be
/// loaded; the predictor then reports the model as unavailable.
fn load_model(config: &Config, profile: &DiseaseProfile) -> ClassifierRegistry {
    let path = config.model_dir.join(ModelArtifact::file_name(&profile.key));
    let mut models = ClassifierRegistry::new();
    let loaded =
        ModelArtifact::load(&path).and_then(|a| models.insert(a, &profile.model_inputs));
    if let Err(e) = loaded {
        log::warn!("{e}");
    }
    models
}

fn run_diseases(diseases: &DiseaseRegistry, args: &DiseasesArgs) -> i32 {
    for p in diseases.profiles() {
        println!(
            "{:<14} {} ({} inputs)",
            p.key,
            p.title,
            p.model_inputs.len()
        );
        if args.ranges {
            for r in &p.ranges {
                let (min, max) = r.bounds();
                println!("    {:<36} {min} to {max}", r.name());
            }
        }
    }
    0
}

fn run_validate(diseases: &DiseaseRegistry, args: &InputArgs) -> i32 {
    let profile = match find_profile(diseases, &args.disease) {
        Ok(p) => p,
        Err(rc) => return rc,
    };
    let input = match collect_inputs(args) {
        Ok(i) => i,
        Err(rc) => return rc,
    };
    let result = diseases.validate(&profile.key, &input);
    println!("{}", result.message);
    if result.valid {
        0
    } else {
        2
    }
}

fn predict_outcome(
    config: &Config,
    diseases: &DiseaseRegistry,
    profile: &DiseaseProfile,
    input: &InputVector,
) -> Result<Outcome, i32> {
    let models = load_model(config, profile);
    match Predictor::new(diseases, &models).predict(&profile.key, input) {
        Ok(outcome) => Ok(outcome),
        Err(e @ PredictError::ModelUnavailable(_)) => {
            eprintln!("error: {e}");
            eprintln!("hint: run 'medidx train {}' first", profile.key);
            Err(1)
        }
        Err(e @ PredictError::MissingInput(_)) => {
            eprintln!("error: {e}");
            Err(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err(1)
        }
    }
}

fn write_report(
    title: &str,
    requester: &str,
    input: &InputVector,
    diagnosis: &str,
    out: &Path,
) -> i32 {
    let report = render_report(title, requester, input, diagnosis);
    let path = if out.extension().is_some() {
        out.to_path_buf()
    } else {
        out.with_extension(report.file_extension())
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("error: failed to create '{}': {e}", parent.display());
            return 1;
        }
    }
    if let Err(e) = fs::write(&path, &report.bytes) {
        eprintln!("error: failed to write '{}': {e}", path.display());
        return 1;
    }
    if report.kind == ReportKind::PlainText {
        eprintln!("note: PDF rendering was unavailable; the report is plain text");
    }
    println!("Report saved to {}", path.display());
    0
}

fn run_predict(config: &Config, diseases: &DiseaseRegistry, args: &PredictArgs) -> i32 {
    let profile = match find_profile(diseases, &args.input.disease) {
        Ok(p) => p,
        Err(rc) => return rc,
    };
    let input = match collect_inputs(&args.input) {
        Ok(i) => i,
        Err(rc) => return rc,
    };
    let user = match &args.report {
        Some(_) => match requester(config) {
            Ok(u) => Some(u),
            Err(rc) => return rc,
        },
        None => None,
    };
    let outcome = match predict_outcome(config, diseases, profile, &input) {
        Ok(o) => o,
        Err(rc) => return rc,
    };

    if args.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        }
    }
    match outcome {
        Outcome::Rejected(v) => {
            if !args.json {
                println!("{}", v.message);
            }
            2
        }
        Outcome::Predicted(p) => {
            if !args.json {
                println!("{}", p.diagnosis);
            }
            match (&args.report, user) {
                (Some(out), Some(user)) => {
                    write_report(&profile.title, &user, &input, &p.diagnosis, out)
                }
                _ => 0,
            }
        }
    }
}

fn run_report(config: &Config, diseases: &DiseaseRegistry, args: &ReportArgs) -> i32 {
    let profile = match find_profile(diseases, &args.input.disease) {
        Ok(p) => p,
        Err(rc) => return rc,
    };
    let user = match requester(config) {
        Ok(u) => u,
        Err(rc) => return rc,
    };
    let input = match collect_inputs(&args.input) {
        Ok(i) => i,
        Err(rc) => return rc,
    };
    match predict_outcome(config, diseases, profile, &input) {
        Ok(Outcome::Predicted(p)) => {
            println!("{}", p.diagnosis);
            write_report(&profile.title, &user, &input, &p.diagnosis, &args.out)
        }
        Ok(Outcome::Rejected(v)) => {
            println!("{}", v.message);
            2
        }
        Err(rc) => rc,
    }
}

fn run_train(config: &Config, diseases: &DiseaseRegistry, args: &TrainArgs) -> i32 {
    let profile = match find_profile(diseases, &args.disease) {
        Ok(p) => p,
        Err(rc) => return rc,
    };
    let path = config.data_dir.join(&profile.dataset.file);
    let data = match Dataset::load(
        &path,
        &profile.dataset.feature_columns,
        &profile.dataset.target_column,
    ) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}: {e}", path.display());
            return 1;
        }
    };
    log::info!(
        "training {} on {} rows of {}",
        args.algorithm,
        data.len(),
        path.display()
    );

    let set = TrainingSet {
        x: &data.rows,
        y: &data.target,
        all_numeric: data.all_numeric,
    };
    let model = match args.algorithm.trainer(config.seed).fit(&set) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {} failed to train: {e}", args.algorithm);
            if let ModelError::NonFinite { row, feature } = e {
                if let Some(column) = profile.dataset.feature_columns.get(feature) {
                    eprintln!(
                        "hint: '{column}' is empty or not a number in data row {}; fill or drop incomplete rows in {}",
                        row + 1,
                        path.display()
                    );
                }
            }
            return 1;
        }
    };
    let artifact = ModelArtifact {
        disease: profile.key.clone(),
        feature_names: profile.model_inputs.clone(),
        class_names: data.class_names.clone(),
        model,
    };
    let out = config.model_dir.join(ModelArtifact::file_name(&profile.key));
    if let Err(e) = artifact.save(&out) {
        eprintln!("error: {e}");
        return 1;
    }
    println!(
        "Trained {} for {} on {} rows; saved {}",
        args.algorithm,
        profile.key,
        data.len(),
        out.display()
    );
    0
}

fn print_records(records: &[MetricRecord]) {
    println!(
        "{:<24} {:>8} {:>9} {:>8} {:>8} {:>8}",
        "Algorithm", "Accuracy", "Precision", "Recall", "F1", "ROC-AUC"
    );
    for r in records {
        let auc = r
            .roc_auc
            .map(|a| format!("{a:.4}"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{:<24} {:>8.4} {:>9.4} {:>8.4} {:>8.4} {:>8}",
            r.algorithm, r.accuracy, r.precision, r.recall, r.f1, auc
        );
    }
}

fn print_json(value: &impl serde::Serialize) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn run_bench(config: &Config, diseases: &DiseaseRegistry, args: &BenchArgs) -> i32 {
    if !(args.test_fraction > 0.0 && args.test_fraction < 1.0) {
        eprintln!("error: --test-fraction must be between 0 and 1");
        return 2;
    }
    let bench = AlgorithmBench::new(config.seed).test_fraction(args.test_fraction);

    let Some(name) = &args.disease else {
        return run_bench_all(config, diseases, &bench, args.json);
    };
    let profile = match find_profile(diseases, name) {
        Ok(p) => p,
        Err(rc) => return rc,
    };
    let mut run = match bench.evaluate_profile(&config.data_dir, profile) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}: {e}", profile.key);
            return 1;
        }
    };
    let records: Vec<MetricRecord> = run.by_ref().collect();
    for (name, e) in run.failures() {
        eprintln!("warning: {name} skipped: {e}");
    }
    if args.json {
        return print_json(&records);
    }
    println!(
        "{} ({} train / {} test rows)",
        profile.title,
        run.train_size(),
        run.test_size()
    );
    print_records(&records);
    0
}

fn run_bench_all(
    config: &Config,
    diseases: &DiseaseRegistry,
    bench: &AlgorithmBench,
    json: bool,
) -> i32 {
    let results = bench.evaluate_all(diseases, &config.data_dir);
    if results.iter().all(|r| r.outcome.is_err()) {
        eprintln!(
            "error: no disease dataset could be loaded from '{}'",
            config.data_dir.display()
        );
        return 1;
    }
    let summary = aggregate(&results);
    let best = best_by_f1(&summary);

    if json {
        let per_disease: Vec<serde_json::Value> = results
            .iter()
            .map(|r| match &r.outcome {
                Ok(records) => serde_json::json!({
                    "disease": r.disease,
                    "records": records,
                    "failures": r.failures,
                }),
                Err(e) => serde_json::json!({
                    "disease": r.disease,
                    "error": e.to_string(),
                }),
            })
            .collect();
        return print_json(&serde_json::json!({
            "diseases": per_disease,
            "summary": summary,
            "best": best.map(|b| b.algorithm.as_str()),
        }));
    }

    for r in &results {
        println!("== {} ==", r.title);
        match &r.outcome {
            Ok(records) => print_records(records),
            Err(e) => println!("unavailable: {e}"),
        }
        for (name, e) in &r.failures {
            eprintln!("warning: {}: {name} skipped: {e}", r.disease);
        }
        println!();
    }
    println!("== Average across diseases ==");
    println!(
        "{:<24} {:>8} {:>8} {:>9} {:>8} {:>8} {:>8}",
        "Algorithm", "Diseases", "Accuracy", "Precision", "Recall", "F1", "ROC-AUC"
    );
    for s in &summary {
        let auc = s
            .roc_auc
            .map(|a| format!("{a:.4}"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{:<24} {:>8} {:>8.4} {:>9.4} {:>8.4} {:>8.4} {:>8}",
            s.algorithm, s.diseases, s.accuracy, s.precision, s.recall, s.f1, auc
        );
    }
    if let Some(b) = best {
        println!();
        println!("Best algorithm by mean F1: {} ({:.4})", b.algorithm, b.f1);
    }
    0
}

fn run_chat(config: &Config, args: &ChatArgs) -> i32 {
    let mut session = match load_session(config) {
        Ok(s) => s,
        Err(rc) => return rc,
    };
    if let Some(place) = &args.location {
        session.conversation.state.user_location = Some(place.clone());
    }

    let rc = if args.messages.is_empty() {
        run_repl(&mut session)
    } else {
        for m in &args.messages {
            println!("{}", session.conversation.send(m));
        }
        0
    };
    if let Err(code) = save_session(config, &session) {
        return code;
    }
    rc
}

fn run_repl(session: &mut Session) -> i32 {
    use rustyline::error::ReadlineError;
    use rustyline::Editor;
    let mut rl = match Editor::<(), rustyline::history::DefaultHistory>::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: failed to initialize chat: {e}");
            return 2;
        }
    };

    if let Some(user) = &session.user {
        println!("Signed in as {}.", user.name);
    }
    println!("Ask about symptoms, tests, lifestyle or nearby hospitals. Type :quit to leave.");
    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }
                match trimmed {
                    ":quit" | ":q" | ":exit" => return 0,
                    ":clear" => {
                        session.conversation.clear();
                        println!("Conversation cleared.");
                    }
                    ":history" => {
                        for turn in &session.conversation.turns {
                            let who = match turn.role {
                                medi_ai::Role::User => "you",
                                medi_ai::Role::Assistant => "assistant",
                            };
                            println!("{who}> {}", turn.text);
                        }
                    }
                    _ => println!("assistant> {}", session.conversation.send(&line)),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return 0,
            Err(e) => {
                eprintln!("error: chat failed: {e}");
                return 1;
            }
        }
    }
}

fn run_account(config: &Config, args: &AccountArgs) -> i32 {
    match &args.command {
        AccountCommand::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let store = match open_accounts(config) {
                Ok(s) => s,
                Err(rc) => return rc,
            };
            match store.register(name, email, password, confirm) {
                Ok(_) => {
                    println!("Registration successful! Please log in.");
                    0
                }
                Err(e) => auth_failure(e),
            }
        }
        AccountCommand::Login { email, password } => {
            let store = match open_accounts(config) {
                Ok(s) => s,
                Err(rc) => return rc,
            };
            let account = match store.login(email, password) {
                Ok(a) => a,
                Err(e) => return auth_failure(e),
            };
            let mut session = match load_session(config) {
                Ok(s) => s,
                Err(rc) => return rc,
            };
            session.login(&account);
            if let Err(rc) = save_session(config, &session) {
                return rc;
            }
            println!("Welcome, {}!", account.name);
            0
        }
        AccountCommand::Logout => {
            let mut session = match load_session(config) {
                Ok(s) => s,
                Err(rc) => return rc,
            };
            if session.user.is_none() {
                println!("Not logged in.");
            }
            session.logout();
            if let Err(rc) = save_session(config, &session) {
                return rc;
            }
            println!("Logged out.");
            0
        }
    }
}

fn auth_failure(e: AuthError) -> i32 {
    match e {
        AuthError::Store(_) => {
            eprintln!("error: {e}");
            1
        }
        other => {
            eprintln!("{other}");
            2
        }
    }
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match Config::resolve(cli.paths.config.as_deref(), &cli.paths.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    log::debug!("{config:?}");
    let diseases = DiseaseRegistry::builtin();

    match &cli.command {
        Command::Diseases(args) => run_diseases(diseases, args),
        Command::Validate(args) => run_validate(diseases, args),
        Command::Predict(args) => run_predict(&config, diseases, args),
        Command::Train(args) => run_train(&config, diseases, args),
        Command::Bench(args) => run_bench(&config, diseases, args),
        Command::Chat(args) => run_chat(&config, args),
        Command::Account(args) => run_account(&config, args),
        Command::Report(args) => run_report(&config, diseases, args),
    }
}

fn main() {
    std::process::exit(run_cli());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_help_lists_commands() {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        cmd.write_long_help(&mut buf).unwrap();
        let help = String::from_utf8(buf).unwrap();
        for sub in ["diseases", "validate", "predict", "train", "bench", "chat", "account", "report"] {
            assert!(help.contains(sub), "help should list '{sub}'");
        }
        assert!(help.contains("EXAMPLES"));
        assert!(help.contains("MEDIDX_DATA_DIR"));
    }

    #[test]
    fn chat_help_mentions_repl_commands() {
        let cmd = Cli::command();
        let chat = cmd
            .get_subcommands()
            .find(|c| c.get_name() == "chat")
            .expect("chat subcommand should exist");
        let long_about = chat
            .get_long_about()
            .map(|s| s.to_string())
            .unwrap_or_default();
        assert!(long_about.contains(":quit"));
        assert!(long_about.contains(":history"));
    }

    #[test]
    fn inputs_parse_as_name_value_pairs() {
        assert_eq!(
            parse_input("Glucose=148"),
            Ok(("Glucose".into(), Number::Int(148)))
        );
        assert_eq!(
            parse_input("BMI=33.0"),
            Ok(("BMI".into(), Number::Float(33.0)))
        );
        assert_eq!(
            parse_input("Total Bilirubin = 0.7"),
            Ok(("Total Bilirubin".into(), Number::Float(0.7)))
        );
        assert_eq!(parse_input("MDVP:Fo(Hz)=119.992").unwrap().0, "MDVP:Fo(Hz)");
        assert!(parse_input("Glucose").is_err());
        assert!(parse_input("=1").is_err());
        assert!(parse_input("Glucose=high").is_err());
    }

    #[test]
    fn train_accepts_algorithm_slugs() {
        let cli = Cli::try_parse_from(["medidx", "train", "diabetes", "-a", "svm"]).unwrap();
        match cli.command {
            Command::Train(args) => assert_eq!(args.algorithm, Algorithm::SupportVectorMachine),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["medidx", "train", "diabetes", "-a", "xgboost"]).is_err());
    }

    #[test]
    fn global_path_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "medidx",
            "diseases",
            "--data-dir",
            "/tmp/d",
            "--seed",
            "5",
        ])
        .unwrap();
        let o = cli.paths.overrides();
        assert_eq!(o.data_dir, Some(PathBuf::from("/tmp/d")));
        assert_eq!(o.seed, Some(5));
        assert_eq!(o.model_dir, None);
    }
}
