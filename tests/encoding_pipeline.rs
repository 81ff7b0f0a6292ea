//! End-to-end tests over the encoding → pooling → head → loss pipeline.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use synpair::{
    extract_pair_feature, training_loss, ClassificationHead, EncodingConfig, FeatureBuilder,
    FeatureLabel, LossKind, MergeType, PairExample, PairLabel, PoolType, SubwordTokenizer,
    WhitespaceTokenizer,
};

fn config() -> EncodingConfig {
    EncodingConfig {
        model_name: "xlm-roberta-base".into(),
        max_seq_len: 16,
        pool_type: PoolType::First,
        target_embeddings: MergeType::Concat,
        mask_syns: false,
        symmetric: false,
        train_scd: false,
        loss: LossKind::CrossentropyLoss,
        roles: vec!["Target".into(), "Synonym".into()],
    }
}

fn cat_dog() -> PairExample {
    PairExample::new("The cat sat", (4, 7), "A dog ran", (2, 5), PairLabel::True).with_id("1")
}

#[test]
fn test_cat_dog_scenario() {
    let config = config();
    let tokenizer = WhitespaceTokenizer;
    let builder = FeatureBuilder::new(&config, &tokenizer).unwrap();
    let (features, stats) = builder.convert(&[cat_dog()]).unwrap();

    assert_eq!(features.len(), 1);
    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.too_long, 0);

    let feature = &features[0];
    // <s> The cat sat </s> A dog ran </s> = 9 real tokens
    assert_eq!(feature.input_mask.iter().sum::<i64>(), 9);

    let cat = tokenizer.convert_tokens_to_ids(&["cat".to_string()])[0];
    let dog = tokenizer.convert_tokens_to_ids(&["dog".to_string()])[0];
    let (t_start, t_end) = feature.span_range(0);
    let (s_start, s_end) = feature.span_range(1);
    assert_eq!(&feature.input_ids[t_start..t_end], &[cat]);
    assert_eq!(&feature.input_ids[s_start..s_end], &[dog]);
}

#[test]
fn test_cat_dog_dropped_at_tiny_seq_len() {
    let mut config = config();
    config.max_seq_len = 4;
    let builder = FeatureBuilder::new(&config, &WhitespaceTokenizer).unwrap();
    let (features, stats) = builder.convert(&[cat_dog()]).unwrap();
    assert!(features.is_empty());
    assert_eq!(stats.too_long, 1);
    assert_eq!(stats.dropped, 1);
}

#[test]
fn test_symmetric_doubles_fully_fitting_examples() {
    let mut config = config();
    config.symmetric = true;
    let builder = FeatureBuilder::new(&config, &WhitespaceTokenizer).unwrap();

    let examples = [cat_dog(), cat_dog().with_id("2")];
    let (features, stats) = builder.convert(&examples).unwrap();
    assert_eq!(features.len(), 4);
    assert_eq!(stats.examples_seen, 2);

    // The swapped orientation equals encoding the role-swapped example.
    let swapped =
        PairExample::new("A dog ran", (2, 5), "The cat sat", (4, 7), PairLabel::True).with_id("1");
    let mut forward_config = config.clone();
    forward_config.symmetric = false;
    let forward_builder = FeatureBuilder::new(&forward_config, &WhitespaceTokenizer).unwrap();
    let (swapped_features, _) = forward_builder.convert(&[swapped]).unwrap();
    assert_eq!(features[1].input_ids, swapped_features[0].input_ids);
    assert_eq!(features[1].positions, swapped_features[0].positions);
}

#[test]
fn test_every_record_is_exactly_max_seq_len() {
    let mut config = config();
    config.symmetric = true;
    let builder = FeatureBuilder::new(&config, &WhitespaceTokenizer).unwrap();
    let examples = [
        cat_dog(),
        PairExample::new("x", (0, 1), "y", (0, 1), PairLabel::False).with_id("tiny"),
        PairExample::new(
            "a b c d e f g h i j k l m n o p q r",
            (0, 1),
            "z",
            (0, 1),
            PairLabel::True,
        )
        .with_id("long"),
    ];
    let (features, _) = builder.convert(&examples).unwrap();
    for feature in &features {
        assert_eq!(feature.input_ids.len(), 16);
        assert_eq!(feature.input_mask.len(), 16);
        for slot in 0..2 {
            let (start, end) = feature.span_range(slot);
            assert!(start <= end);
            assert!(end <= 15, "position {end} escaped the padded sequence");
        }
    }
}

#[test]
fn test_full_forward_path() {
    let config = config();
    let builder = FeatureBuilder::new(&config, &WhitespaceTokenizer).unwrap();
    let (features, _) = builder.convert(&[cat_dog()]).unwrap();
    let feature = &features[0];

    // Stand-in for the external encoder: hidden[i][j] = i + j.
    let hidden_size = 8;
    let hidden = Array2::from_shape_fn((config.max_seq_len, hidden_size), |(i, j)| {
        (i + j) as f32
    });

    let merged = extract_pair_feature(
        hidden.view(),
        &feature.positions,
        config.pool_type,
        config.target_embeddings,
    )
    .unwrap();
    assert_eq!(merged.len(), config.head_input_size(hidden_size));

    let mut rng = StdRng::seed_from_u64(3);
    let head = ClassificationHead::for_config(&config, hidden_size, 0.1, &mut rng).unwrap();
    let logits = head.forward(merged.view()).unwrap();
    assert_eq!(logits.len(), 2);

    let loss = training_loss(logits.view(), &feature.label).unwrap();
    assert!(loss.is_finite() && loss >= 0.0);
}

#[test]
fn test_regression_forward_path() {
    let mut config = config();
    config.train_scd = true;
    config.loss = LossKind::MseLoss;
    config.pool_type = PoolType::Mean;
    config.target_embeddings = MergeType::FeatwiseMul;

    let builder = FeatureBuilder::new(&config, &WhitespaceTokenizer).unwrap();
    let (features, _) = builder.convert(&[cat_dog().with_score(0.4)]).unwrap();
    assert_eq!(features[0].label, FeatureLabel::Score(0.4));

    let hidden_size = 4;
    let hidden = Array2::from_elem((config.max_seq_len, hidden_size), 0.5f32);
    let merged = extract_pair_feature(
        hidden.view(),
        &features[0].positions,
        config.pool_type,
        config.target_embeddings,
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let head = ClassificationHead::for_config(&config, hidden_size, 0.0, &mut rng).unwrap();
    assert_eq!(head.output_size(), 1);
    let logits = head.forward(merged.view()).unwrap();
    let loss = training_loss(logits.view(), &features[0].label).unwrap();
    assert!((loss - (logits[0] - 0.4).powi(2)).abs() < 1e-6);
}
