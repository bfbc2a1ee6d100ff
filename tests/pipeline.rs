use std::io::Write;

use trail_topics::{
    cluster_documents, extract_topics, utils::math::DenseMatrix, AnalysisError, Corpus, CorpusSource,
    CsvCorpusSource, KMeansConfig, NmfConfig, PipelineConfig, StopWords, TermSpace,
};

fn five_trails() -> Corpus {
    Corpus::from_texts([
        "lake shore",
        "lake shore lake",
        "shore lake",
        "summit ridge",
        "ridge summit summit",
    ])
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn brute_force_labels(space: &TermSpace, centroids: &DenseMatrix) -> Vec<usize> {
    space
        .matrix
        .rows()
        .iter()
        .map(|row| {
            let dense = row.to_dense();
            (0..centroids.n_rows())
                .min_by(|&a, &b| {
                    squared_distance(&dense, centroids.row(a)).total_cmp(&squared_distance(&dense, centroids.row(b)))
                })
                .unwrap()
        })
        .collect()
}

/// Same partition up to renaming of the labels.
fn same_partition(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len()
        && (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
}

#[test]
fn five_documents_two_clusters() {
    let config = PipelineConfig {
        clustering: Some(KMeansConfig::new(2).with_seed(42)),
        ..PipelineConfig::default()
    };
    let (space, model) = cluster_documents(&five_trails(), &StopWords::new(), &config).unwrap();

    assert_eq!(space.feature_names(), vec!["lake", "ridge", "shore", "summit"]);
    assert_eq!(model.labels.len(), 5);
    assert!(model.labels.iter().all(|&l| l < 2));
    assert_eq!(model.cluster_sizes().iter().sum::<usize>(), 5);
    assert_eq!(model.labels, brute_force_labels(&space, &model.centroids));
    assert!(same_partition(&model.labels, &[0, 0, 0, 1, 1]));
    assert!(model.centroids.as_slice().iter().all(|&v| v >= 0.0));
}

#[test]
fn same_seed_same_partition() {
    let config = PipelineConfig {
        clustering: Some(KMeansConfig::new(2).with_seed(7)),
        ..PipelineConfig::default()
    };
    let (_, a) = cluster_documents(&five_trails(), &StopWords::new(), &config).unwrap();
    let (_, b) = cluster_documents(&five_trails(), &StopWords::new(), &config).unwrap();
    assert_eq!(a.labels, b.labels);
}

#[test]
fn empty_corpus_is_rejected() {
    let config = PipelineConfig {
        clustering: Some(KMeansConfig::new(2)),
        topics: Some(NmfConfig::new(2)),
        ..PipelineConfig::default()
    };
    let err = cluster_documents(&Corpus::new(), &StopWords::new(), &config).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyCorpus));
    let err = extract_topics(&Corpus::new(), &StopWords::new(), &config).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyCorpus));
}

#[test]
fn topics_label_documents_by_share() {
    let config = PipelineConfig {
        topics: Some(NmfConfig::new(2).with_seed(5)),
        ..PipelineConfig::default()
    };
    let (space, model) = extract_topics(&five_trails(), &StopWords::new(), &config).unwrap();

    assert_eq!(model.doc_topic.n_rows(), space.n_docs());
    for doc in 0..space.n_docs() {
        let shares = model.doc_topic_share.row(doc);
        let total: f64 = shares.iter().sum();
        assert!(total == 0.0 || (total - 1.0).abs() < 1e-6);
        for (topic, &share) in shares.iter().enumerate() {
            assert_eq!(model.membership.get(doc, topic), share >= 0.1);
        }
    }
}

#[test]
fn csv_to_clusters() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "trail_id,description,lemmatized_text").unwrap();
    writeln!(file, "a,Around the lake,lake shore").unwrap();
    writeln!(file, "b,Lakeside stroll,lake shore lake").unwrap();
    writeln!(file, "c,Up the ridge,summit ridge").unwrap();
    writeln!(file, "d,Ridge run,ridge summit summit").unwrap();
    file.flush().unwrap();

    let corpus = CsvCorpusSource::new(file.path()).with_id_column("trail_id").load().unwrap();
    let config = PipelineConfig::from_json_str(r#"{"clustering": {"n_clusters": 2, "seed": 3}}"#).unwrap();
    let stop: StopWords = ["the"].into_iter().collect();
    let (_, model) = cluster_documents(&corpus, &stop, &config).unwrap();

    assert_eq!(corpus.ids().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    assert!(same_partition(&model.labels, &[0, 0, 1, 1]));
}
