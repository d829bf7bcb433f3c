//! Student strategy: pseudo-label mixing, target encoding, evaluation
//! symmetry.

mod common;

use common::{config_with, distill_batch, labeled_batch, phone_vocab, ScriptedModel};
use destilar::config::StepInterval;
use destilar::data::InMemoryLoader;
use destilar::metrics::NullSink;
use destilar::model::AsrModel;
use destilar::text::{TextProcessor, PAD_ID};
use destilar::train::{StudentStrategy, Trainer};
use tempfile::TempDir;

#[test]
fn test_override_rows_carry_gold_transcripts_exactly() {
    let tmp = TempDir::new().unwrap();
    let vocab = phone_vocab();
    let config = config_with(tmp.path(), 1, "one_cycle", StepInterval::Step);

    // The teacher hears "x y" everywhere; rows 1 and 3 carry gold labels.
    let teacher = ScriptedModel::new("TeacherNet", &["x y"]);
    let student = ScriptedModel::new("StudentNet", &[]);
    let strategy = StudentStrategy::new(teacher, student, vocab.clone());
    let mut trainer = Trainer::new(config, strategy, Box::new(NullSink)).unwrap();

    let batch = distill_batch(4, vec![(1, "a".to_string()), (3, "b".to_string())]);
    let train_loader = InMemoryLoader::new(vec![batch]);
    let val_loader = InMemoryLoader::new(vec![labeled_batch(&vocab, &["x y"])]);

    trainer.train(&train_loader, &val_loader).unwrap();

    let student = trainer.strategy().student();
    // First forward call is the training pass over the mixed targets.
    let (targets, lengths) = &student.seen_targets[0];

    let pseudo = vocab.text_to_ids(&vocab.tokenize("x y"));
    let gold_a = vocab.text_to_ids(&vocab.tokenize("a"));
    let gold_b = vocab.text_to_ids(&vocab.tokenize("b"));

    // Non-override rows keep the teacher's recognized output.
    assert_eq!(targets.row(0).to_vec(), pseudo);
    assert_eq!(targets.row(2).to_vec(), pseudo);

    // Override rows equal the tokenized/encoded gold transcripts exactly,
    // padded to the batch maximum.
    assert_eq!(targets.row(1).to_vec(), vec![gold_a[0], PAD_ID]);
    assert_eq!(targets.row(3).to_vec(), vec![gold_b[0], PAD_ID]);

    // True lengths ride alongside the padded array.
    assert_eq!(lengths, &vec![2, 1, 2, 1]);
}

#[test]
fn test_student_trains_and_teacher_stays_frozen() {
    let tmp = TempDir::new().unwrap();
    let vocab = phone_vocab();
    let config = config_with(tmp.path(), 1, "one_cycle", StepInterval::Step);

    let teacher = ScriptedModel::new("TeacherNet", &["x y"]);
    let student = ScriptedModel::new("StudentNet", &[]);
    let mut trainer = Trainer::new(
        config,
        StudentStrategy::new(teacher, student, vocab.clone()),
        Box::new(NullSink),
    )
    .unwrap();

    let train_loader = InMemoryLoader::new(vec![distill_batch(2, vec![])]);
    let val_loader = InMemoryLoader::new(vec![labeled_batch(&vocab, &["x y"])]);
    trainer.train(&train_loader, &val_loader).unwrap();

    let student = trainer.strategy().student();
    // Training pass (predict=false) plus one validation pass (predict=true),
    // both against the student.
    assert_eq!(student.forward_calls, vec![false, true]);
    // The validation recognition also ran on the student.
    assert_eq!(student.recognize_calls, 1);
    // Gradient flowed into the student, so its parameters moved.
    assert_ne!(student.state().parameters[0].data, vec![0.5, -0.25, 0.1]);
}

#[test]
fn test_student_checkpoints_carry_student_names() {
    let tmp = TempDir::new().unwrap();
    let vocab = phone_vocab();
    let config = config_with(tmp.path(), 1, "one_cycle", StepInterval::Step);

    let mut trainer = Trainer::new(
        config,
        StudentStrategy::new(
            ScriptedModel::new("TeacherNet", &["x y"]),
            ScriptedModel::new("StudentNet", &[]),
            vocab.clone(),
        ),
        Box::new(NullSink),
    )
    .unwrap();

    let train_loader = InMemoryLoader::new(vec![distill_batch(1, vec![])]);
    let val_loader = InMemoryLoader::new(vec![labeled_batch(&vocab, &["x y"])]);
    trainer.train(&train_loader, &val_loader).unwrap();

    let names: Vec<String> = std::fs::read_dir(tmp.path().join("version_0"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("StudentTrainer.")));
    assert!(names.iter().any(|n| n.starts_with("StudentNet.")));
    // The frozen teacher's blob is never written.
    assert!(!names.iter().any(|n| n.starts_with("TeacherNet.")));
}

#[test]
fn test_out_of_range_override_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let vocab = phone_vocab();
    let config = config_with(tmp.path(), 1, "one_cycle", StepInterval::Step);

    let mut trainer = Trainer::new(
        config,
        StudentStrategy::new(
            ScriptedModel::new("TeacherNet", &["x y"]),
            ScriptedModel::new("StudentNet", &[]),
            vocab.clone(),
        ),
        Box::new(NullSink),
    )
    .unwrap();

    let train_loader = InMemoryLoader::new(vec![distill_batch(2, vec![(5, "a".to_string())])]);
    let val_loader = InMemoryLoader::new(vec![labeled_batch(&vocab, &["x y"])]);

    let err = trainer.train(&train_loader, &val_loader).unwrap_err();
    assert!(err.to_string().contains("override row 5"));
}
