use std::collections::BTreeMap;

use asl_hmm_rs::{
    Criterion, FeatureMatrix, Recognizer, Selector, SelectorConfig, TrainingData, WordModel,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FEATURE_DIM: usize = 3;
const FRAMES_PER_PHASE: usize = 6;
const TRAIN_SEQUENCES_PER_WORD: usize = 4;

/// Each word is a left-to-right gesture through a few well-separated
/// feature-space phases; sequences are noisy renditions of that path.
fn word_phases() -> BTreeMap<&'static str, Vec<[f64; FEATURE_DIM]>> {
    BTreeMap::from([
        ("BOOK", vec![[0.0, 0.0, 0.0], [10.0, 0.0, 5.0]]),
        ("CHAIR", vec![[20.0, 20.0, 0.0], [20.0, 5.0, 15.0]]),
        ("JOHN", vec![[-15.0, 8.0, -10.0], [-15.0, -8.0, 10.0]]),
    ])
}

fn render_sequence(phases: &[[f64; FEATURE_DIM]], rng: &mut StdRng) -> Array2<f64> {
    let mut rows = Vec::with_capacity(phases.len() * FRAMES_PER_PHASE * FEATURE_DIM);
    for phase in phases {
        for _ in 0..FRAMES_PER_PHASE {
            for &center in phase {
                rows.push(center + (rng.gen::<f64>() - 0.5) * 0.6);
            }
        }
    }
    Array2::from_shape_vec((phases.len() * FRAMES_PER_PHASE, FEATURE_DIM), rows)
        .expect("rectangular sequence data")
}

fn training_data(seed: u64) -> TrainingData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = TrainingData::new();
    for (word, phases) in word_phases() {
        let sequences: Vec<Array2<f64>> = (0..TRAIN_SEQUENCES_PER_WORD)
            .map(|_| render_sequence(&phases, &mut rng))
            .collect();
        data.insert_word(word, sequences).expect("valid sequences");
    }
    data
}

fn test_items(seed: u64) -> (Vec<FeatureMatrix>, Vec<&'static str>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut items = Vec::new();
    let mut expected = Vec::new();
    for (word, phases) in word_phases() {
        for _ in 0..2 {
            let seq = render_sequence(&phases, &mut rng);
            items.push(FeatureMatrix::from_single(seq).expect("valid test item"));
            expected.push(word);
        }
    }
    (items, expected)
}

fn select_all(
    selector: &Selector,
    data: &TrainingData,
    criterion: Criterion,
) -> Vec<(String, Option<Box<dyn WordModel>>)> {
    data.all_features()
        .keys()
        .map(|word| {
            let model = selector
                .select(word, data, criterion)
                .expect("selection input is well-formed");
            (word.clone(), model)
        })
        .collect()
}

#[test]
fn every_strategy_produces_models_with_in_range_state_counts() {
    let config = SelectorConfig {
        max_states: 6,
        ..SelectorConfig::default()
    };
    let data = training_data(101);
    let selector = Selector::new(config.clone());

    for criterion in [
        Criterion::Constant,
        Criterion::Bic,
        Criterion::Dic,
        Criterion::CrossValidation,
    ] {
        for (word, model) in select_all(&selector, &data, criterion) {
            let model = model.unwrap_or_else(|| panic!("{criterion:?} found no model for {word}"));
            let n = model.n_states();
            assert!(
                (config.min_states..=config.max_states).contains(&n)
                    || n == config.constant_states,
                "{criterion:?} gave {word} an out-of-range state count {n}"
            );
            let own = data.features(&word).expect("word exists");
            assert!(model.score(own).expect("own data scores").is_finite());
        }
    }
}

#[test]
fn recognizer_identifies_held_out_renditions() {
    let data = training_data(202);
    let selector = Selector::new(SelectorConfig {
        max_states: 5,
        ..SelectorConfig::default()
    });

    let results = select_all(&selector, &data, Criterion::CrossValidation);
    let recognizer = Recognizer::from_selection(results);
    assert_eq!(recognizer.vocabulary_size(), 3);

    let (items, expected) = test_items(999);
    let output = recognizer.recognize(&items);
    assert_eq!(output.guesses.len(), items.len());
    assert_eq!(output.score_tables.len(), items.len());

    for (i, (guess, expected_word)) in output.guesses.iter().zip(&expected).enumerate() {
        assert_eq!(
            guess.as_deref(),
            Some(*expected_word),
            "item {i} misrecognized: table {:?}",
            output.score_tables[i]
        );
        // every word in the vocabulary got a score entry
        assert_eq!(output.score_tables[i].len(), 3);
    }
}

#[test]
fn selection_is_reproducible_for_a_fixed_seed() {
    let data = training_data(303);
    let config = SelectorConfig {
        max_states: 5,
        ..SelectorConfig::default()
    };
    let probe = data.features("BOOK").expect("word exists");

    for criterion in [Criterion::Bic, Criterion::Dic, Criterion::CrossValidation] {
        let first = Selector::new(config.clone())
            .select("BOOK", &data, criterion)
            .unwrap()
            .expect("model selected");
        let second = Selector::new(config.clone())
            .select("BOOK", &data, criterion)
            .unwrap()
            .expect("model selected");
        assert_eq!(first.n_states(), second.n_states());
        assert_eq!(
            first.score(probe).unwrap(),
            second.score(probe).unwrap(),
            "{criterion:?} selection not reproducible"
        );
    }
}

#[test]
fn degenerate_inputs_raise_defined_errors() {
    let mut lone = TrainingData::new();
    let mut rng = StdRng::seed_from_u64(7);
    let phases = vec![[0.0, 0.0, 0.0], [5.0, 5.0, 5.0]];
    lone.insert_word(
        "ONLY",
        (0..3).map(|_| render_sequence(&phases, &mut rng)).collect(),
    )
    .expect("valid sequences");

    let selector = Selector::new(SelectorConfig::default());
    // DIC has nothing to contrast a single-word vocabulary against
    let dic = selector.select("ONLY", &lone, Criterion::Dic);
    assert!(matches!(
        dic,
        Err(asl_hmm_rs::RecognitionError::InsufficientData { .. })
    ));

    // cross-validation cannot split a single-sequence word into two folds
    let mut single_seq = TrainingData::new();
    single_seq
        .insert_word("ONCE", vec![render_sequence(&phases, &mut rng)])
        .expect("valid sequences");
    single_seq
        .insert_word("TWICE", (0..2).map(|_| render_sequence(&phases, &mut rng)).collect())
        .expect("valid sequences");
    let cv = selector.select("ONCE", &single_seq, Criterion::CrossValidation);
    assert!(matches!(
        cv,
        Err(asl_hmm_rs::RecognitionError::InsufficientData { .. })
    ));
}
