use std::io::Write;
use std::sync::Arc;

use judiciary_chart::data::metrics::{MetricCatalog, BILLIONS_AXIS_LABEL};
use judiciary_chart::data::{
    DataLoader, DataProcessor, LoaderError, MetricError, ResolutionPolicy, SchemaError,
};
use judiciary_chart::{FilterSelection, Pipeline, PipelineConfig, PipelineError};
use proptest::prelude::*;

const STATES: [&str; 5] = ["AC", "AM", "BA", "RJ", "SP"];
const MAGISTRATE_METRIC: &str = "Average Expense per Magistrate";

fn exact() -> PipelineConfig {
    PipelineConfig {
        policy: ResolutionPolicy::Exact,
        catalog: MetricCatalog::fixed_default(),
    }
}

fn fuzzy() -> PipelineConfig {
    PipelineConfig {
        policy: ResolutionPolicy::FuzzySubstring,
        catalog: MetricCatalog::fixed_default(),
    }
}

fn selection(year: &str, states: &[&str], metric: &str) -> FilterSelection {
    FilterSelection {
        year: year.to_string(),
        states: states.iter().map(|s| s.to_string()).collect(),
        metric: metric.to_string(),
    }
}

#[test]
fn loads_csv_from_disk_and_defaults_to_first_two_states() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ano,sigla_uf,despesa_media_magistrado").unwrap();
    writeln!(file, "2022,SP,450000.00").unwrap();
    writeln!(file, "2022,BA,350000.00").unwrap();
    writeln!(file, "2022,AM,300000.00").unwrap();
    file.flush().unwrap();

    let dataset = DataLoader::load_path(file.path()).unwrap();
    let pipeline = Pipeline::new(Arc::new(dataset), exact()).unwrap();

    let states = pipeline.state_candidates("2022").unwrap();
    assert_eq!(states, vec!["AM", "BA", "SP"]);

    let sel = pipeline.default_selection().unwrap();
    assert_eq!(sel.year, "2022");
    assert_eq!(sel.states, vec!["AM", "BA"]);
    assert_eq!(DataProcessor::default_states(&states), sel.states);
}

#[test]
fn fuzzy_resolution_handles_messy_headers() {
    let csv = "Ano Referência,Sigla_UF ,despesa_media_magistrado\n2022,SP,450000\n2022,RJ,400000\n";

    let err = Pipeline::from_bytes(csv.as_bytes().to_vec(), exact()).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(SchemaError::MissingColumns(_))));

    let pipeline = Pipeline::from_bytes(csv.as_bytes().to_vec(), fuzzy()).unwrap();
    assert_eq!(pipeline.columns().year, "ano referência");
    assert_eq!(pipeline.columns().state, "sigla_uf");

    let result = pipeline
        .run(&selection("2022", &["RJ", "SP"], MAGISTRATE_METRIC))
        .unwrap();
    assert_eq!(result.bars.len(), 2);
}

#[test]
fn billions_transform_rescales_total_expense() {
    let csv = "ano,sigla_uf,despesa_total_pib,despesa_media_magistrado,despesa_total_justica_estadual\n\
               2022,SP,0.0123,450000.00,15000000000\n";
    let pipeline = Pipeline::from_bytes(csv.as_bytes().to_vec(), exact()).unwrap();
    let result = pipeline
        .run(&selection("2022", &["SP"], "Total State Judiciary Expense"))
        .unwrap();

    assert_eq!(result.bars[0].value, 15.0);
    assert_eq!(result.y_label, BILLIONS_AXIS_LABEL);
    assert_eq!(result.bars[0].label.as_deref(), Some("15.00"));

    let gdp = pipeline
        .run(&selection("2022", &["SP"], "Total Expense / GDP (%)"))
        .unwrap();
    assert_eq!(gdp.bars[0].value, 0.0123);
    assert_eq!(gdp.bars[0].label.as_deref(), Some("1.23%"));
}

#[test]
fn absent_year_signals_empty_selection() {
    let csv = "ano,sigla_uf,despesa_media_magistrado\n2020,SP,1\n2021,SP,2\n";
    let pipeline = Pipeline::from_bytes(csv.as_bytes().to_vec(), exact()).unwrap();

    assert_eq!(pipeline.year_candidates().unwrap(), vec!["2020", "2021"]);
    assert!(pipeline.state_candidates("2022").unwrap().is_empty());

    let err = pipeline
        .run(&selection("2022", &["SP"], MAGISTRATE_METRIC))
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptySelection { .. }));
    assert!(err.to_string().contains("No data found"));
}

#[test]
fn missing_state_column_fails_before_any_filtering() {
    let csv = "ano,despesa_media_magistrado\n2022,1\n";
    let err = Pipeline::from_bytes(csv.as_bytes().to_vec(), exact()).unwrap_err();
    match err {
        PipelineError::Schema(SchemaError::MissingColumns(missing)) => {
            assert_eq!(missing, vec!["sigla_uf"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn every_error_kind_has_its_own_message() {
    let parse = Pipeline::from_bytes(b"   ".to_vec(), exact()).unwrap_err();
    assert!(matches!(parse, PipelineError::Load(LoaderError::Empty)));

    let csv = "ano,sigla_uf,nome\n2022,SP,Sao Paulo\n";
    let auto = Pipeline::from_bytes(
        csv.as_bytes().to_vec(),
        PipelineConfig {
            policy: ResolutionPolicy::Exact,
            catalog: MetricCatalog::auto_default(),
        },
    )
    .unwrap();
    let no_numeric = auto.metric_options().unwrap_err();
    assert!(matches!(
        no_numeric,
        PipelineError::Metric(MetricError::NoNumericColumns)
    ));

    let fixed = Pipeline::from_bytes(csv.as_bytes().to_vec(), exact()).unwrap();
    let not_found = fixed
        .run(&selection("2022", &["SP"], MAGISTRATE_METRIC))
        .unwrap_err();
    assert!(matches!(
        not_found,
        PipelineError::Metric(MetricError::ColumnNotFound(_))
    ));

    let messages = [
        parse.to_string(),
        no_numeric.to_string(),
        not_found.to_string(),
    ];
    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert_ne!(messages[0], messages[2]);
}

fn build_csv(rows: &[(i64, usize, u32)]) -> String {
    let mut csv = String::from("ano,sigla_uf,despesa_media_magistrado\n");
    for (year, state, value) in rows {
        csv.push_str(&format!("{},{},{}\n", year, STATES[*state], value));
    }
    csv
}

fn sorted_pairs(mut pairs: Vec<(String, u64)>) -> Vec<(String, u64)> {
    pairs.sort();
    pairs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn filtered_view_matches_reference_filter(
        rows in prop::collection::vec((2019i64..2023, 0usize..STATES.len(), 0u32..1_000_000), 1..40),
        year_pick in 0usize..8,
        mask in prop::collection::vec(any::<bool>(), STATES.len()),
    ) {
        let pipeline = Pipeline::from_bytes(build_csv(&rows).into_bytes(), exact()).unwrap();

        let years = pipeline.year_candidates().unwrap();
        let year = years[year_pick % years.len()].clone();
        let candidates = pipeline.state_candidates(&year).unwrap();
        let chosen: Vec<String> = candidates
            .iter()
            .zip(mask.iter().cycle())
            .filter(|(_, keep)| **keep)
            .map(|(s, _)| s.clone())
            .collect();

        let reference = sorted_pairs(
            rows.iter()
                .filter(|(y, s, _)| y.to_string() == year && chosen.iter().any(|c| c == STATES[*s]))
                .map(|(_, s, v)| (STATES[*s].to_string(), *v as u64))
                .collect(),
        );

        let sel = FilterSelection { year: year.clone(), states: chosen, metric: MAGISTRATE_METRIC.to_string() };
        match pipeline.run(&sel) {
            Ok(result) => {
                let actual = sorted_pairs(
                    result.bars.iter().map(|b| (b.state.clone(), b.raw as u64)).collect(),
                );
                prop_assert_eq!(actual, reference);
                prop_assert_eq!(result.table.height(), result.bars.len());
            }
            Err(PipelineError::EmptySelection { .. }) => prop_assert!(reference.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn rerunning_the_same_selection_is_idempotent(
        rows in prop::collection::vec((2020i64..2022, 0usize..STATES.len(), 0u32..1_000_000), 1..30),
    ) {
        let pipeline = Pipeline::from_bytes(build_csv(&rows).into_bytes(), exact()).unwrap();
        let mut sel = pipeline.default_selection().unwrap();
        sel.metric = MAGISTRATE_METRIC.to_string();

        let first = pipeline.run(&sel).unwrap();
        let second = pipeline.run(&sel).unwrap();
        prop_assert_eq!(&first.bars, &second.bars);
        prop_assert!(first.table.equals(&second.table));
        prop_assert_eq!(first.summary, second.summary);
    }
}
