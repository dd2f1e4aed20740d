use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const ENV_VARS: &[&str] = &[
    "MEDIDX_CONFIG",
    "MEDIDX_DATA_DIR",
    "MEDIDX_MODEL_DIR",
    "MEDIDX_ACCOUNTS",
    "MEDIDX_SESSION",
    "MEDIDX_SEED",
    "RUST_LOG",
];

const POSITIVE: &[&str] = &[
    "Pregnancies=2",
    "Glucose=180",
    "BloodPressure=70",
    "SkinThickness=20",
    "Insulin=80",
    "BMI=30",
    "DiabetesPedigreeFunction=0.5",
    "Age=40",
];

fn medidx(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_medidx"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--data-dir")
        .arg(root.join("data"))
        .arg("--model-dir")
        .arg(root.join("models"))
        .arg("--accounts")
        .arg(root.join("accounts"))
        .arg("--session")
        .arg(root.join("session.json"));
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("spawn medidx")
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

/// Diabetes rows where glucose alone decides the outcome.
fn write_diabetes_csv(root: &Path) {
    let dir = root.join("data");
    fs::create_dir_all(&dir).unwrap();
    let mut csv = String::from(
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n",
    );
    for i in 0..40 {
        let positive = i % 2;
        let glucose = if positive == 1 { 150 + i } else { 80 + i / 2 };
        csv.push_str(&format!(
            "{},{glucose},70,20,80,{},0.5,{},{positive}\n",
            (i / 2) % 4,
            25 + i % 9,
            30 + i
        ));
    }
    fs::write(dir.join("diabetes.csv"), csv).unwrap();
}

fn train_tree(root: &Path) {
    let out = run(medidx(root).args(["train", "diabetes", "--algorithm", "decision-tree"]));
    assert!(out.status.success(), "train failed: {}", stderr(&out));
    assert!(root.join("models").join("diabetes.json").exists());
}

#[test]
fn e2e_train_points_at_missing_cells() {
    let dir = tempfile::tempdir().unwrap();
    write_diabetes_csv(dir.path());
    let path = dir.path().join("data").join("diabetes.csv");
    let text = fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    // blank the BMI cell of the third data row
    let mut cells: Vec<&str> = lines[3].split(',').collect();
    cells[5] = "";
    lines[3] = cells.join(",");
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let out = run(medidx(dir.path()).args(["train", "diabetes", "-a", "decision-tree"]));
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("failed to train"), "{err}");
    assert!(err.contains("'BMI' is empty or not a number in data row 3"), "{err}");
    assert!(!dir.path().join("models").join("diabetes.json").exists());
}

#[test]
fn e2e_diseases_lists_builtin_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(medidx(dir.path()).args(["diseases", "--ranges"]));
    assert!(out.status.success());
    let text = stdout(&out);
    for key in ["diabetes", "heart", "parkinsons", "liver", "breast-cancer"] {
        assert!(text.contains(key), "missing {key}");
    }
    assert!(text.contains("Glucose"));
    assert!(text.contains("0.1 to 67.1"));
    assert!(text.contains("1 to 200"));
}

#[test]
fn e2e_validate_reports_the_first_bad_value() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(medidx(dir.path()).args(["validate", "diabetes", "Glucose=250", "Age=40"]));
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(
        stdout(&out).trim(),
        "Invalid value for 'Glucose'. Please enter a value between 1 and 200."
    );

    let out = run(medidx(dir.path()).args(["validate", "Diabetes Prediction", "Glucose=120"]));
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "All inputs are valid.");

    let out = run(medidx(dir.path()).args(["validate", "asthma"]));
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("unknown disease"));
}

#[test]
fn e2e_train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    write_diabetes_csv(dir.path());
    train_tree(dir.path());

    let out = run(medidx(dir.path()).arg("predict").arg("diabetes").args(POSITIVE));
    assert!(out.status.success(), "predict failed: {}", stderr(&out));
    assert_eq!(
        stdout(&out).trim(),
        "The person is diabetic (probability: 100.0%). Please consult a doctor."
    );

    let out = run(
        medidx(dir.path())
            .args(["predict", "diabetes", "--json"])
            .args(POSITIVE),
    );
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["outcome"], "predicted");
    assert_eq!(json["positive"], true);
}

#[test]
fn e2e_predict_rejects_before_needing_a_model() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(medidx(dir.path()).args(["predict", "diabetes", "Glucose=0"]));
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).contains("Invalid value for 'Glucose'"));

    let out = run(medidx(dir.path()).args(["predict", "heart"]));
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("medidx train heart"));
}

#[test]
fn e2e_report_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    write_diabetes_csv(dir.path());
    train_tree(dir.path());
    let report = dir.path().join("out").join("result");

    let out = run(
        medidx(dir.path())
            .args(["report", "diabetes", "-o"])
            .arg(&report)
            .args(POSITIVE),
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("please log in"));

    let out = run(medidx(dir.path()).args([
        "account",
        "register",
        "--name",
        "Ana",
        "--email",
        "ana@example.com",
        "--password",
        "pw",
        "--confirm-password",
        "pw",
    ]));
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run(medidx(dir.path()).args([
        "account",
        "login",
        "--email",
        "ana@example.com",
        "--password",
        "wrong",
    ]));
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Invalid email or password."));

    let out = run(medidx(dir.path()).args([
        "account",
        "login",
        "--email",
        "ana@example.com",
        "--password",
        "pw",
    ]));
    assert!(out.status.success());
    assert!(stdout(&out).contains("Welcome, Ana!"));

    let out = run(
        medidx(dir.path())
            .args(["report", "diabetes", "-o"])
            .arg(&report)
            .args(POSITIVE),
    );
    assert!(out.status.success(), "report failed: {}", stderr(&out));
    let bytes = fs::read(report.with_extension("pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let out = run(medidx(dir.path()).args(["account", "logout"]));
    assert!(out.status.success());
    let out = run(
        medidx(dir.path())
            .args(["predict", "diabetes", "--report"])
            .arg(&report)
            .args(POSITIVE),
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn e2e_duplicate_registration_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let register = |dir: &Path| {
        run(medidx(dir).args([
            "account",
            "register",
            "--name",
            "Bo",
            "--email",
            "bo@example.com",
            "--password",
            "x",
            "--confirm-password",
            "x",
        ]))
    };
    assert!(register(dir.path()).status.success());
    let again = register(dir.path());
    assert_eq!(again.status.code(), Some(2));
    assert!(stderr(&again).contains("This email address is already registered."));
}

#[test]
fn e2e_chat_messages_persist_in_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(medidx(dir.path()).args(["chat", "-m", "hello", "-m", "diabetes"]));
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).starts_with("Hello! I'm your AI health assistant."));

    let session: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(session["conversation"]["turns"].as_array().unwrap().len(), 4);
    assert_eq!(session["conversation"]["state"]["last_topic"], "diabetes");
}

#[test]
fn e2e_bench_uses_config_file_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_diabetes_csv(dir.path());
    let config = dir.path().join("medidx.json");
    fs::write(
        &config,
        serde_json::json!({ "data_dir": dir.path().join("data") }).to_string(),
    )
    .unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_medidx"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    let out = run(cmd
        .env("MEDIDX_CONFIG", &config)
        .args(["bench", "diabetes", "--json"]));
    assert!(out.status.success(), "bench failed: {}", stderr(&out));
    let records: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["algorithm"], "Random Forest");
    for r in records {
        let cm = r["confusion_matrix"].as_array().unwrap();
        let total: u64 = cm
            .iter()
            .flat_map(|row| row.as_array().unwrap())
            .map(|v| v.as_u64().unwrap())
            .sum();
        assert_eq!(total, 10);
    }
}

#[test]
fn e2e_bench_all_summarizes_available_datasets() {
    let dir = tempfile::tempdir().unwrap();
    write_diabetes_csv(dir.path());
    let out = run(medidx(dir.path()).arg("bench"));
    assert!(out.status.success(), "bench failed: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("== Diabetes Prediction =="));
    assert!(text.contains("== Average across diseases =="));
    assert!(text.contains("Best algorithm by mean F1"));

    let empty = tempfile::tempdir().unwrap();
    let out = run(medidx(empty.path()).arg("bench"));
    assert_eq!(out.status.code(), Some(1));
}
