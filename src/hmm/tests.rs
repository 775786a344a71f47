use super::*;

/// Two-state weather model with three observation symbols
fn weather_model() -> DiscreteHmm {
    DiscreteHmm::from_rows(
        vec![0.6, 0.4],
        &[vec![0.7, 0.3], vec![0.4, 0.6]],
        &[vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
    )
    .unwrap()
}

/// Sum over all state paths, used to check the scaled recursions
fn brute_force_likelihood(model: &DiscreteHmm, obs: &[usize]) -> f64 {
    let n = model.n_states();
    let paths = n.pow(obs.len() as u32);
    (0..paths)
        .map(|mut code| {
            let mut states = Vec::with_capacity(obs.len());
            for _ in 0..obs.len() {
                states.push(code % n);
                code /= n;
            }
            let mut p = model.start()[states[0]] * model.emission(states[0], obs[0]);
            for t in 1..obs.len() {
                p *= model.transition(states[t - 1], states[t]) * model.emission(states[t], obs[t]);
            }
            p
        })
        .sum()
}

#[test]
fn test_likelihood_matches_brute_force() {
    let model = weather_model();
    let obs = [0, 1, 2, 2, 0];
    let expected = brute_force_likelihood(&model, &obs).ln();
    let actual = model.log_likelihood(&obs).unwrap();
    assert!((expected - actual).abs() < 1e-10, "{} vs {}", expected, actual);
}

#[test]
fn test_viterbi_known_path() {
    // Classic example: walk, shop, clean
    let model = DiscreteHmm::from_rows(
        vec![0.6, 0.4],
        &[vec![0.7, 0.3], vec![0.4, 0.6]],
        &[vec![0.5, 0.4, 0.1], vec![0.1, 0.3, 0.6]],
    )
    .unwrap();
    let (path, log_prob) = model.viterbi(&[0, 1, 2]).unwrap();
    assert_eq!(path, vec![0, 0, 1]);
    assert!((log_prob - 0.01512f64.ln()).abs() < 1e-9);
}

#[test]
fn test_posteriors_are_distributions() {
    let model = weather_model();
    let posteriors = model.posteriors(&[2, 2, 0, 1]).unwrap();
    assert_eq!(posteriors.gamma.len(), 4);
    for row in &posteriors.gamma {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
    assert_eq!(posteriors.argmax()[0], 0);
    assert_eq!(posteriors.argmax()[2], 1);
}

#[test]
fn test_invalid_observations() {
    let model = weather_model();
    assert_eq!(model.viterbi(&[]), Err(HmmError::EmptySequence));
    assert_eq!(
        model.log_likelihood(&[0, 3]),
        Err(HmmError::SymbolOutOfRange {
            symbol: 3,
            n_symbols: 3
        })
    );
}

#[test]
fn test_non_stochastic_rows_rejected() {
    let result = DiscreteHmm::from_rows(
        vec![0.5, 0.5],
        &[vec![0.5, 0.6], vec![0.5, 0.5]],
        &[vec![1.0], vec![1.0]],
    );
    assert!(matches!(
        result,
        Err(HmmError::NotStochastic {
            what: "transition",
            row: 0,
            ..
        })
    ));

    let result = DiscreteHmm::new(vec![1.0], vec![1.0], vec![0.5, 0.5], 3);
    assert!(matches!(result, Err(HmmError::DimensionMismatch(_))));
}

#[test]
fn test_zero_probability_sequence() {
    let model = DiscreteHmm::from_rows(
        vec![1.0, 0.0],
        &[vec![1.0, 0.0], vec![0.0, 1.0]],
        &[vec![1.0, 0.0], vec![0.0, 1.0]],
    )
    .unwrap();
    assert_eq!(model.viterbi(&[0, 1]), Err(HmmError::ZeroProbability));
    assert_eq!(model.log_likelihood(&[0, 1]), Err(HmmError::ZeroProbability));
}

#[test]
fn test_fit_increases_likelihood() {
    let mut model = weather_model();
    let sequences = vec![
        vec![0, 0, 1, 2, 2, 2, 1, 0, 0, 0],
        vec![2, 2, 2, 1, 0, 0, 1, 2, 2],
        vec![0, 1, 0, 0, 2, 2, 2, 2],
    ];
    let before: f64 = sequences
        .iter()
        .map(|s| model.log_likelihood(s).unwrap())
        .sum();

    let report = model.fit(&sequences, &FitOptions::default()).unwrap();

    let after: f64 = sequences
        .iter()
        .map(|s| model.log_likelihood(s).unwrap())
        .sum();
    assert!(report.iterations >= 1);
    assert!(after > before, "{} <= {}", after, before);
    assert!((report.log_likelihood - after).abs() < 1e-9);
    for row in model.transition_rows().iter().chain(model.emission_rows().iter()) {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_fit_keeps_structural_zeros() {
    // Left-to-right model: state 1 never returns to state 0
    let mut model = DiscreteHmm::from_rows(
        vec![0.9, 0.1],
        &[vec![0.8, 0.2], vec![0.0, 1.0]],
        &[vec![0.7, 0.3], vec![0.2, 0.8]],
    )
    .unwrap();
    let sequences = vec![vec![0, 0, 1, 1, 1], vec![0, 1, 0, 1, 1]];
    model.fit(&sequences, &FitOptions::default()).unwrap();
    assert_eq!(model.transition(1, 0), 0.0);
}

#[test]
fn test_emission_floor_keeps_probabilities_positive() {
    let mut model = weather_model();
    // Symbol 1 never observed
    let sequences = vec![vec![0, 0, 2, 2, 0, 2]];
    let options = FitOptions {
        emission_floor: 1e-3,
        ..Default::default()
    };
    model.fit(&sequences, &options).unwrap();
    for row in model.emission_rows() {
        assert!(row.iter().all(|&p| p >= 1e-3 - 1e-12));
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
    // An unseen symbol can still be decoded
    assert!(model.viterbi(&[1, 1]).is_ok());
}

#[test]
fn test_fit_respects_update_flags() {
    let mut model = weather_model();
    let original_emission = model.emission_rows();
    let options = FitOptions {
        update_emission: false,
        emission_floor: 0.0,
        ..Default::default()
    };
    model.fit(&[vec![0, 1, 2, 0]], &options).unwrap();
    assert_eq!(model.emission_rows(), original_emission);
}

#[test]
fn test_fit_rejects_bad_input() {
    let mut model = weather_model();
    let empty: Vec<Vec<usize>> = Vec::new();
    assert_eq!(
        model.fit(&empty, &FitOptions::default()),
        Err(HmmError::NoSequences)
    );
    let options = FitOptions {
        emission_floor: 0.5,
        ..Default::default()
    };
    assert!(matches!(
        model.fit(&[vec![0]], &options),
        Err(HmmError::InvalidParameter(_))
    ));
}

#[test]
fn test_estimate_from_labels() {
    let tracks = vec![vec![0, 0, 0, 1, 1, 2], vec![0, 0, 1, 1, 1, 2, 2]];
    let model = DiscreteHmm::estimate_from_labels(&tracks, 3, 0.8, 0.0).unwrap();

    assert_eq!(model.start(), &[1.0, 0.0, 0.0]);
    assert!((model.transition(0, 0) - 3.0 / 5.0).abs() < 1e-12);
    assert!((model.transition(0, 1) - 2.0 / 5.0).abs() < 1e-12);
    assert_eq!(model.transition(2, 2), 1.0);
    // State 1 is never entered as a start state
    assert_eq!(model.start()[1], 0.0);
    assert!((model.emission(1, 1) - 0.8).abs() < 1e-12);
    assert!((model.emission(1, 0) - 0.1).abs() < 1e-12);
}

#[test]
fn test_smoothing_removes_single_frame_flips() {
    let tracks = vec![
        vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2],
        vec![0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    ];
    let model = DiscreteHmm::estimate_from_labels(&tracks, 3, 0.8, 0.1).unwrap();
    let noisy = [0, 0, 2, 0, 1, 1, 0, 1, 2, 2, 2];
    let smoothed = model.smooth(&noisy).unwrap();
    assert_eq!(smoothed, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2]);
}

#[test]
fn test_estimate_rejects_bad_parameters() {
    let tracks = vec![vec![0, 1]];
    assert!(DiscreteHmm::estimate_from_labels(&tracks, 2, 0.0, 1.0).is_err());
    assert!(DiscreteHmm::estimate_from_labels(&tracks, 2, 0.9, -1.0).is_err());
    assert!(matches!(
        DiscreteHmm::estimate_from_labels(&tracks, 1, 0.9, 1.0),
        Err(HmmError::SymbolOutOfRange { .. })
    ));
}

#[test]
fn test_fit_reports_every_iteration() {
    let mut model = weather_model();
    let sequences = vec![vec![0, 0, 1, 2, 2, 1, 0], vec![2, 2, 1, 0, 0]];
    let options = FitOptions {
        max_iterations: 5,
        tolerance: 0.0,
        ..Default::default()
    };

    let mut seen = Vec::new();
    let report = model
        .fit_with(&sequences, &options, |r| {
            seen.push(r.iterations);
            Ok(())
        })
        .unwrap();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.iterations, 5);
    assert!(!report.converged);
}

#[test]
fn test_fit_can_be_interrupted() {
    let mut model = weather_model();
    let sequences = vec![vec![0, 0, 1, 2, 2, 1, 0]];
    let options = FitOptions {
        max_iterations: 50,
        tolerance: 0.0,
        ..Default::default()
    };

    let mut calls = 0;
    let result = model.fit_with(&sequences, &options, |r| {
        calls += 1;
        if r.iterations == 2 {
            Err(HmmError::Interrupted)
        } else {
            Ok(())
        }
    });
    assert_eq!(result, Err(HmmError::Interrupted));
    assert_eq!(calls, 2);
    for row in model.transition_rows() {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
