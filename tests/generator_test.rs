//! Integration tests for QuestionGenerator.

mod common;

use common::{FixedModel, ScriptedModel};
use squash_qgen::{
    Error, FinishReason, GenerationConfig, Instance, QuestionClass, QuestionGenerator, SpecialTokens,
};

const VOCAB: usize = 6;
const SPECIAL: u32 = 5;

fn special() -> SpecialTokens {
    SpecialTokens::from_ids([SPECIAL; 8])
}

fn instance() -> Instance {
    Instance::new(0, vec![0, 1, 2], vec![1], QuestionClass::General, "rule")
}

fn greedy(max_length: usize, min_length: usize) -> GenerationConfig {
    GenerationConfig::default()
        .greedy()
        .max_length(max_length)
        .min_length(min_length)
}

#[test]
fn test_stops_on_special_token() {
    let mut model = ScriptedModel::new(VOCAB, vec![3, 3, SPECIAL], SPECIAL);
    let mut generator = QuestionGenerator::new(greedy(3, 1), special()).unwrap();

    let (generated, past) = generator.generate(&mut model, instance(), Some(4)).unwrap();

    assert_eq!(generated.question, vec![3, 3]);
    assert_eq!(generated.finish_reason, FinishReason::EndOfSequence);
    assert_eq!(model.num_calls(), 3);

    // Prompt <answer-c> A <question-c>, then one token per call
    assert_eq!(model.calls[0].input_ids, vec![SPECIAL, 1, SPECIAL]);
    assert_eq!(model.calls[0].past, Some(4));
    assert_eq!(model.calls[1].input_ids, vec![3]);
    assert_eq!(model.calls[1].token_type_ids, vec![SPECIAL]);
    assert_eq!(model.calls[2].past, Some(8));
    assert_eq!(past, 9);
}

#[test]
fn test_stops_at_max_length() {
    let mut model = ScriptedModel::new(VOCAB, vec![], 2);
    let mut generator = QuestionGenerator::new(greedy(4, 1), special()).unwrap();

    let (generated, _) = generator.generate(&mut model, instance(), None).unwrap();

    assert_eq!(generated.question, vec![2, 2, 2, 2]);
    assert_eq!(generated.finish_reason, FinishReason::MaxLength);
    // Prompt plus one call per appended token
    assert_eq!(model.num_calls(), 5);
}

#[test]
fn test_zero_max_length_produces_empty_question() {
    let mut model = ScriptedModel::new(VOCAB, vec![], 2);
    let mut generator = QuestionGenerator::new(greedy(0, 0), special()).unwrap();

    let (generated, _) = generator.generate(&mut model, instance(), None).unwrap();

    assert!(generated.question.is_empty());
    assert_eq!(generated.finish_reason, FinishReason::MaxLength);
    assert_eq!(model.num_calls(), 1);
}

#[test]
fn test_special_token_never_appended() {
    let config = GenerationConfig::default()
        .temperature(1.0)
        .top_p(0.0)
        .max_length(20)
        .min_length(5)
        .seed(3);
    let mut generator = QuestionGenerator::new(config, special()).unwrap();
    // The special token carries most of the mass
    let mut model = FixedModel {
        logits: vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0],
    };

    for _ in 0..20 {
        let (generated, _) = generator.generate(&mut model, instance(), None).unwrap();
        assert!(generated.question.len() >= 5);
        assert!(generated.question.len() <= 20);
        assert!(!generated.question.contains(&SPECIAL));
    }
}

#[test]
fn test_greedy_is_deterministic() {
    let run = || {
        let mut model = ScriptedModel::new(VOCAB, vec![4, 1, 2, 3], SPECIAL);
        let mut generator = QuestionGenerator::new(greedy(10, 1), special()).unwrap();
        generator.generate(&mut model, instance(), None).unwrap().0
    };
    let first = run();
    assert_eq!(first.question, vec![4, 1, 2, 3]);
    assert_eq!(first, run());
}

#[test]
fn test_sampling_is_reproducible_with_seed() {
    let config = GenerationConfig::default()
        .temperature(1.0)
        .top_p(0.0)
        .max_length(15)
        .seed(11);
    let logits = vec![0.5, 0.1, 0.3, 0.2, 0.4, -1.0];

    let run = || {
        let mut model = FixedModel {
            logits: logits.clone(),
        };
        let mut generator = QuestionGenerator::new(config.clone(), special()).unwrap();
        (0..5)
            .map(|_| generator.generate(&mut model, instance(), None).unwrap().0.question)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_guard_forces_min_length_under_greedy() {
    // Greedy would pick the special token immediately; the guard redraws.
    let mut model = FixedModel {
        logits: vec![0.0, 0.0, 0.0, 1.0, 0.0, 3.0],
    };
    let config = greedy(10, 2).top_p(0.0);
    let mut generator = QuestionGenerator::new(config, special()).unwrap();

    let (generated, _) = generator.generate(&mut model, instance(), None).unwrap();

    assert_eq!(generated.question.len(), 2);
    assert_eq!(generated.finish_reason, FinishReason::EndOfSequence);
}

#[test]
fn test_guard_fails_fast_when_only_special_tokens_have_mass() {
    let mut model = FixedModel {
        logits: vec![0.0, 0.0, 0.0, 0.0, 0.0, 10.0],
    };
    // top_k = 1 leaves only the special token
    let config = greedy(10, 1).top_k(1);
    let mut generator = QuestionGenerator::new(config, special()).unwrap();

    let result = generator.generate(&mut model, instance(), None);
    assert!(matches!(result, Err(Error::SpecialTokensOnly { produced: 0 })));
}

#[test]
fn test_resample_cap_takes_most_probable_content_token() {
    let mut model = ScriptedModel::new(VOCAB, vec![SPECIAL], SPECIAL);
    let config = greedy(10, 1).top_p(0.0).max_resamples(0);
    let mut generator = QuestionGenerator::new(config, special()).unwrap();

    let (generated, _) = generator.generate(&mut model, instance(), None).unwrap();

    // All content tokens tie; the first one wins
    assert_eq!(generated.question, vec![0]);
}
