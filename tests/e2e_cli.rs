
use assert_cmd::prelude::*;
use cli_helpers::{base_cmd, run_cmd, run_cmd_json, upload, TestEnv};
use predicates::prelude::*;
use xlsx_fixtures::{scenario_file_one, scenario_file_two};

fn env_with_scenario() -> TestEnv {
    let env = TestEnv::new();
    let one = env.write_input("file1.xlsx", &scenario_file_one());
    let two = env.write_input("file2.xlsx", &scenario_file_two());
    upload(&env, "lubricants", &[&one, &two]).expect("upload should succeed");
    env
}

#[test]
fn totals_on_empty_store_no_color_when_piped() {
    let env = TestEnv::new();

    base_cmd(&env)
        .arg("totals")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales Overview"))
        .stdout(predicate::str::contains("0.00"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    assert!(env.stored_dir("lubricants").is_dir());
    assert!(env.stored_dir("petroleum").is_dir());
}

#[test]
fn upload_then_totals_json() {
    let env = env_with_scenario();

    let totals = run_cmd_json(&env, &["totals"]).unwrap();
    assert_eq!(totals["totalUsers"], 3);
    assert_eq!(totals["totalOrders"], 5);
    assert_eq!(totals["totalSales"].as_f64(), Some(45.0));
}

#[test]
fn upload_reports_stored_names_and_files_lists_them() {
    let env = TestEnv::new();
    let one = env.write_input("file1.xlsx", &scenario_file_one());

    let result = upload(&env, "petroleum", &[&one]).unwrap();
    assert_eq!(result["category"], "petroleum");
    let stored = result["stored"][0].as_str().unwrap().to_string();
    assert!(stored.ends_with("-file1.xlsx"));

    let listing = run_cmd_json(&env, &["files"]).unwrap();
    assert_eq!(listing["lubricants"].as_array().unwrap().len(), 0);
    assert_eq!(listing["petroleum"][0]["name"], stored.as_str());
}

#[test]
fn upload_rejects_non_spreadsheet_and_too_many_files() {
    let env = TestEnv::new();
    let csv = env.write_input("sales.csv", b"a,b\n1,2\n");

    base_cmd(&env)
        .args(["upload", "lubricants"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a .xlsx spreadsheet"));

    let paths: Vec<_> = (0..6)
        .map(|i| env.write_input(&format!("f{}.xlsx", i), &scenario_file_one()))
        .collect();
    base_cmd(&env)
        .args(["upload", "lubricants"])
        .args(&paths)
        .assert()
        .failure()
        .stderr(predicate::str::contains("too many files"));

    let listing = run_cmd_json(&env, &["files"]).unwrap();
    assert!(listing["lubricants"].as_array().unwrap().is_empty());
}

#[test]
fn upload_rejects_unknown_category() {
    let env = TestEnv::new();
    let one = env.write_input("file1.xlsx", &scenario_file_one());

    base_cmd(&env)
        .args(["upload", "diesel"])
        .arg(&one)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid category"));
}

#[test]
fn yearly_text_output() {
    let env = env_with_scenario();

    base_cmd(&env)
        .arg("yearly")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales by year"))
        .stdout(predicate::str::contains("2022"))
        .stdout(predicate::str::contains("40.00"))
        .stdout(predicate::str::contains("45.00"));
}

#[test]
fn grouped_json_and_missing_category() {
    let env = env_with_scenario();

    let sums = run_cmd_json(&env, &["grouped", "sales grp", "--category", "lubricants"]).unwrap();
    assert_eq!(sums["G1"].as_f64(), Some(37.0));
    assert_eq!(sums["G2"].as_f64(), Some(5.0));
    assert_eq!(sums["G3"].as_f64(), Some(3.0));

    base_cmd(&env)
        .args(["grouped", "sales grp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("category is required"));

    base_cmd(&env)
        .args(["grouped", "region", "-c", "lubricants"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"));
}

#[test]
fn table_json_and_csv_export() {
    let env = env_with_scenario();
    let csv_path = env.input_path("march.csv");
    let csv_arg = csv_path.display().to_string();

    let args = ["table", "2023", "March", "--export", csv_arg.as_str()];
    let table = run_cmd_json(&env, &args).unwrap();
    assert_eq!(table["year"], 2023);
    assert_eq!(table["month"], 3);
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["billing date"] == "2023-03-15"));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert_eq!(
        header,
        "sales grp,customer code,customer name,material code,shipping point name,\
         vehicle text,billing date,quantity in su,material name,sku qty"
    );
    assert_eq!(lines.count(), 3);

    let first_keys: Vec<&str> = rows[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        first_keys,
        vec![
            "sales grp",
            "customer code",
            "customer name",
            "material code",
            "shipping point name",
            "vehicle text",
            "billing date",
            "quantity in su",
        ]
    );
}

#[test]
fn table_rejects_unknown_month() {
    let env = TestEnv::new();

    base_cmd(&env)
        .args(["table", "2023", "Smarch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid month"));
}

#[test]
fn table_text_output_for_empty_month() {
    let env = env_with_scenario();

    base_cmd(&env)
        .args(["table", "2021", "july"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows billed in july 2021"));
}

#[test]
fn delete_and_delete_all() {
    let env = env_with_scenario();

    let listing = run_cmd_json(&env, &["files"]).unwrap();
    let first = listing["lubricants"][0]["name"].as_str().unwrap().to_string();

    run_cmd(&env, &["delete", "lubricants", first.as_str()]).unwrap();
    base_cmd(&env)
        .args(["delete", "lubricants", first.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    base_cmd(&env)
        .args(["delete", "lubricants", "../escape.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid file name"));

    let result = run_cmd_json(&env, &["delete-all", "lubricants"]).unwrap();
    assert_eq!(result["deleted"], 1);

    let totals = run_cmd_json(&env, &["totals"]).unwrap();
    assert_eq!(totals["totalOrders"], 0);
}

#[test]
fn check_reports_matching_schema() {
    let env = TestEnv::new();
    let one = env.write_input("file1.xlsx", &scenario_file_one());

    base_cmd(&env)
        .arg("check")
        .arg(&one)
        .assert()
        .success()
        .stdout(predicate::str::contains("schema A"))
        .stdout(predicate::str::contains("1 of 1 sheets accepted"));

    let path = one.display().to_string();
    let checks = run_cmd_json(&env, &["check", path.as_str()]).unwrap();
    assert_eq!(checks[0]["sheet"], "Sheet1");
    assert_eq!(checks[0]["rows"], 3);
}

#[test]
fn data_dir_from_environment() {
    let env = TestEnv::new();
    let alt = env.home.path().join("alt-store");

    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin!("sales-digest"));
    cmd.env("HOME", env.home.path())
        .env("XDG_CONFIG_HOME", env.home.path().join(".config"))
        .env("SALES_DIGEST_DATA_DIR", &alt)
        .args(["--json", "files"]);
    cmd.assert().success();

    assert!(alt.join("excel-files").join("lubricants").is_dir());
}
