use anyhow::Result;
use deepq_core::{
    bellman_targets, dummy::DummyValueFunction, DataFormat, HistoryBuffer, ReplayBufferBase,
    ReplayMemory, ReplayMemoryConfig, ValueFunction,
};

fn build(capacity: usize, history_length: usize) -> Result<ReplayMemory> {
    let config = ReplayMemoryConfig::default()
        .capacity(capacity)
        .history_length(history_length)
        .obs_dim(1)
        .seed(42);
    ReplayMemory::build(&config)
}

#[test]
fn keeps_last_capacity_transitions_in_order() -> Result<()> {
    let mut memory = build(7, 2)?;
    for k in 0..23 {
        memory.add(&[k as f32], 0.0, k % 4, k % 5 == 0);
    }

    assert_eq!(memory.count(), 7);
    let transitions = memory.transitions();
    let observations: Vec<f32> = transitions.iter().map(|tr| tr.observation[0]).collect();
    assert_eq!(observations, (16..23).map(|k| k as f32).collect::<Vec<_>>());
    let actions: Vec<usize> = transitions.iter().map(|tr| tr.action).collect();
    assert_eq!(actions, (16..23).map(|k| k % 4).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn terminal_transition_does_not_bootstrap() -> Result<()> {
    let mut memory = build(10, 2)?;
    let rewards = [0.0, 0.0, 0.0, 0.0, 1.0];
    for (k, o) in [1.0f32, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
        memory.add(&[*o], rewards[k], 1, k == 4);
    }

    let batch = memory.batch_at(&[4])?;
    assert_eq!(batch.states, vec![3.0, 4.0]);
    assert_eq!(batch.next_states, vec![4.0, 5.0]);
    assert_eq!(batch.rewards, vec![1.0]);
    assert_eq!(batch.terminals, vec![true]);

    let target = DummyValueFunction::new(2, 2).with_params(vec![50.0, 70.0]);
    let max_q_next = target.predict_max_value(&batch.next_states)?;
    assert_eq!(max_q_next, vec![70.0]);
    let targets = bellman_targets(&batch.rewards, &batch.terminals, &max_q_next, 0.99);
    assert_eq!(targets, vec![1.0]);
    Ok(())
}

#[test]
fn non_terminal_transition_bootstraps() -> Result<()> {
    let mut memory = build(10, 2)?;
    for o in 1..=5 {
        memory.add(&[o as f32], 0.5, 0, false);
    }

    let batch = memory.batch_at(&[3])?;
    let target = DummyValueFunction::new(2, 2).with_entry(vec![3.0, 4.0], vec![2.0, -1.0]);
    let max_q_next = target.predict_max_value(&batch.next_states)?;
    let targets = bellman_targets(&batch.rewards, &batch.terminals, &max_q_next, 0.5);
    assert_eq!(targets, vec![0.5 + 0.5 * 2.0]);
    Ok(())
}

#[test]
fn sampled_windows_are_consecutive_frames() -> Result<()> {
    let history_length = 4;
    let mut memory = build(32, history_length)?;
    for k in 0..100 {
        memory.add(&[k as f32], 0.0, 0, k % 9 == 0);
    }

    for _ in 0..20 {
        let batch = memory.batch(16)?;
        for i in 0..batch.len() {
            let state = batch.state(i);
            let next_state = batch.next_state(i);
            assert_eq!(state.len(), history_length);
            assert_eq!(next_state.len(), history_length);
            assert_eq!(&state[1..], &next_state[..history_length - 1]);
            for w in next_state.windows(2) {
                assert_eq!(w[1], w[0] + 1.0);
            }
        }
    }
    Ok(())
}

#[test]
fn sampled_state_matches_history_window() -> Result<()> {
    let config = ReplayMemoryConfig::default()
        .capacity(20)
        .history_length(3)
        .obs_dim(2)
        .data_format(DataFormat::ChannelsLast);
    let mut memory = ReplayMemory::build(&config)?;
    let mut history = HistoryBuffer::new(3, 2, DataFormat::ChannelsLast);
    for k in 0..6 {
        let o = [k as f32, 10.0 * k as f32];
        memory.add(&o, 0.0, 0, false);
        history.add(&o);
    }

    let batch = memory.batch_at(&[5])?;
    assert_eq!(batch.next_state(0), &history.get()[..]);
    Ok(())
}
