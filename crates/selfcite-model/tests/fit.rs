//! End-to-end model fits on synthetic long tables.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use selfcite_model::{AuthFilter, ModelError, ModelOptions, Target, run_model};

const HEADER: &str = "eid_citing,document_type,year_citing,year_cited,num_auth_citing,num_auth_cited,\
num_ref_citing,field,auth_type,sc,academic_age,num_prev_papers,affil_continent,gender";

struct Lcg(u64);

impl Lcg {
    fn uniform(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("{HEADER}\n{body}")).unwrap();
    path
}

/// 1200 pair rows; every 17th has no academic age, every 13th a single citing author.
fn pairs_table(dir: &Path) -> PathBuf {
    let mut rng = Lcg(42);
    let mut body = String::new();
    for i in 0..1200u64 {
        let la = i % 2 == 1;
        let age = 1 + (i * 11) % 35;
        let eta = -0.5 + if la { 0.8 } else { 0.0 } - 0.03 * age as f64;
        let sc = u8::from(rng.uniform() < 1.0 / (1.0 + (-eta).exp()));
        let year = 2010 + i % 10;
        writeln!(
            body,
            "2-s2.0-{},{},{year},{},{},3,{},{},{},{sc},{},{},{},{}",
            i / 4,
            if i % 5 == 0 { "re" } else { "ar" },
            year - (i * 7) % 20,
            if i % 13 == 0 { 1 } else { 2 + i % 6 },
            20 + i % 40,
            ["neuro", "chem", "phys"][(i / 7 % 3) as usize],
            if la { "la" } else { "fa" },
            if i % 17 == 0 { String::new() } else { age.to_string() },
            (i * 13) % 80,
            ["Asia", "Europe", "North America"][(i / 3 % 3) as usize],
            if (i / 5) % 2 == 0 { "male" } else { "female" },
        )
        .unwrap();
    }
    write(dir, "long.csv", &body)
}

#[test]
fn pairs_model_with_default_formula() {
    let dir = tempfile::tempdir().unwrap();
    let input = pairs_table(dir.path());
    let options = ModelOptions::default();
    let report = run_model(&input, &options, None).unwrap();
    let fit = &report.fit;

    assert!(fit.converged);
    assert_eq!(fit.nobs, 1200 - 158);
    assert_eq!(report.dropped, 0);
    assert_eq!(
        fit.names,
        [
            "Intercept",
            "document_type[T.re]",
            "field[T.neuro]",
            "field[T.phys]",
            "C(affil_continent, Treatment(reference=\"Asia\"))[T.Europe]",
            "C(affil_continent, Treatment(reference=\"Asia\"))[T.North America]",
            "gender[T.male]",
            "auth_type[T.la]",
            "year_citing",
            "time_lag",
            "num_auth_citing",
            "num_ref_citing",
            "academic_age",
            "num_prev_papers",
            "year_citing:auth_type[T.la]",
            "gender[T.male]:num_prev_papers",
        ]
    );
    assert!(fit.llf > fit.llnull);
    assert!(fit.std_err.iter().all(|se| se.is_finite() && *se > 0.0));
    for (i, (low, high)) in fit.conf_int.iter().enumerate() {
        assert!(*low < fit.params[i] && fit.params[i] < *high);
    }

    let out = dir.path().join(report.file_name());
    report.write_csv(&out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 17);
    assert!(out.ends_with("model_pairs_all.csv"));
}

#[test]
fn first_author_filter_drops_auth_type_terms() {
    let dir = tempfile::tempdir().unwrap();
    let input = pairs_table(dir.path());
    let options = ModelOptions {
        auth: AuthFilter::Fa,
        ..Default::default()
    };
    let report = run_model(&input, &options, None).unwrap();
    assert!(!report.fit.names.iter().any(|n| n.contains("auth_type")));
    assert_eq!(report.fit.names.len(), 14);
}

/// 60 articles with 10 references per author type and 30 references in total;
/// every third article self-cites 9 times, the rest twice.
#[test]
fn extreme_model_groups_articles() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::new();
    for article in 0..60u64 {
        let hits = if article % 3 == 0 { 9 } else { 2 };
        let age = 1 + (article * 7) % 40;
        for auth in ["fa", "la"] {
            for r in 0..10 {
                writeln!(
                    body,
                    "2-s2.0-{article},ar,2020,2010,3,2,30,neuro,{auth},{},{age},5,Europe,female",
                    u8::from(r < hits)
                )
                .unwrap();
            }
        }
    }
    let input = write(dir.path(), "long.csv", &body);
    let options = ModelOptions {
        target: Target::Extreme,
        auth: AuthFilter::All,
        transform: true,
    };
    let report = run_model(&input, &options, Some("highly_citing ~ academic_age + auth_type")).unwrap();
    assert_eq!(report.fit.nobs, 120);
    assert_eq!(report.fit.names, ["Intercept", "auth_type[T.la]", "academic_age"]);
    // Both author types share every article's outcome
    assert!(report.fit.params[1].abs() < 1e-6);
    assert!(report.file_name().starts_with("model_extreme_all"));
}

#[test]
fn bad_inputs_are_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let input = pairs_table(dir.path());
    let options = ModelOptions::default();

    let err = run_model(&input, &options, Some("gender ~ academic_age")).unwrap_err();
    assert!(matches!(err, ModelError::NotNumeric(_)));
    assert!(err.is_input_error());

    let err = run_model(&input, &options, Some("sc ~ no_such_column")).unwrap_err();
    assert!(matches!(err, ModelError::MissingColumn(_)));

    let err = run_model(&dir.path().join("absent.csv"), &options, None).unwrap_err();
    assert!(matches!(err, ModelError::Read { .. }));
}
