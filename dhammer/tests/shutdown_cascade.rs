/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use dhammer::subsystem::Role;
use dhammer::{HammerError, Phase};
use std::sync::Arc;
use std::time::Duration;
use support::{eventually, fake_hammer, Fixture};

const ROLES: [Role; 4] = [
    Role::Transport,
    Role::Handler,
    Role::Generator,
    Role::Statistics,
];

fn position(journal: &[String], entry: &str) -> usize {
    journal
        .iter()
        .position(|recorded| recorded == entry)
        .unwrap_or_else(|| panic!("{entry} missing from {journal:?}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn external_stop_triggers_exactly_one_ordered_cascade() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |_| {});
    hammer.init("127.0.0.1:0").await.expect("init");
    fixture.watch_control_plane(hammer.control_addr().expect("control address"));
    let hammer = Arc::new(hammer);

    let running = hammer.clone();
    let run = tokio::spawn(async move { running.run().await });
    assert!(eventually(|| fixture.writes() > 0).await);

    hammer.stop().await.expect("stop");
    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run should return")
        .expect("run task")
        .expect("run result");

    assert_eq!(
        fixture.journal(),
        vec![
            "statistics.init",
            "transport.init",
            "handler.init",
            "transport.set_receiver",
            "generator.init",
            "generator.stop",
            "control_plane.closed",
            "transport.stop_listener",
            "handler.stop",
            "transport.stop_writer",
            "statistics.stop",
            "generator.stop",
            "transport.deinit",
            "handler.deinit",
            "generator.deinit",
            "statistics.deinit",
        ]
    );
    for role in ROLES {
        assert_eq!(hammer.phase(role), Some(Phase::DeInitialized));
    }
    assert_eq!(fixture.channels_open(), (false, false, false));
}

#[tokio::test(flavor = "multi_thread")]
async fn no_write_reaches_transport_after_stop_returns() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |_| {});
    hammer.init("127.0.0.1:0").await.expect("init");
    let hammer = Arc::new(hammer);

    let running = hammer.clone();
    let run = tokio::spawn(async move { running.run().await });
    assert!(eventually(|| fixture.writes() >= 5).await);

    hammer.stop().await.expect("stop");
    let writes = fixture.writes();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(fixture.writes(), writes);
    run.await.expect("run task").expect("run result");
}

#[tokio::test(flavor = "multi_thread")]
async fn natural_completion_tears_down_without_external_stop() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |config| config.generator.count = Some(5));
    hammer.init("127.0.0.1:0").await.expect("init");

    tokio::time::timeout(Duration::from_secs(10), hammer.run())
        .await
        .expect("run should end when the generator completes")
        .expect("run result");

    assert_eq!(fixture.writes(), 5);
    let journal = fixture.journal();
    assert_eq!(
        journal.iter().filter(|entry| *entry == "generator.stop").count(),
        1
    );
    assert!(position(&journal, "statistics.stop") < position(&journal, "generator.stop"));
    assert!(position(&journal, "generator.stop") < position(&journal, "generator.deinit"));
    assert_eq!(fixture.channels_open(), (false, false, false));
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_before_run_lets_run_finish_immediately() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |_| {});
    hammer.init("127.0.0.1:0").await.expect("init");

    hammer.stop().await.expect("stop");
    tokio::time::timeout(Duration::from_secs(10), hammer.run())
        .await
        .expect("run should not hang")
        .expect("run result");

    assert_eq!(fixture.writes(), 0);
    assert_eq!(hammer.phase(Role::Generator), Some(Phase::DeInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_stop_step_does_not_abort_the_cascade() {
    support::init_logging();
    let fixture = Fixture::new();
    fixture.fail_stop(Role::Handler);
    let mut hammer = fake_hammer(&fixture, |config| config.generator.count = Some(3));
    hammer.init("127.0.0.1:0").await.expect("init");

    tokio::time::timeout(Duration::from_secs(10), hammer.run())
        .await
        .expect("run should return")
        .expect("run result");

    let journal = fixture.journal();
    assert!(position(&journal, "handler.stop") < position(&journal, "transport.stop_writer"));
    for role in ROLES {
        assert_eq!(hammer.phase(role), Some(Phase::DeInitialized));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_generator_stop_is_returned_to_the_caller() {
    support::init_logging();
    let fixture = Fixture::new();
    fixture.fail_stop(Role::Generator);
    let mut hammer = fake_hammer(&fixture, |config| config.generator.count = Some(20));
    hammer.init("127.0.0.1:0").await.expect("init");
    let hammer = Arc::new(hammer);

    let running = hammer.clone();
    let run = tokio::spawn(async move { running.run().await });

    assert!(matches!(hammer.stop().await, Err(HammerError::Config(_))));

    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run should end when the generator completes")
        .expect("run task")
        .expect("run result");
    assert_eq!(fixture.writes(), 20);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_after_completed_run_is_a_no_op() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |config| config.generator.count = Some(1));
    hammer.init("127.0.0.1:0").await.expect("init");

    hammer.run().await.expect("run");
    assert_eq!(hammer.phase(Role::Generator), Some(Phase::DeInitialized));

    hammer.stop().await.expect("late stop should succeed");

    let journal = fixture.journal();
    assert_eq!(
        journal.iter().filter(|entry| *entry == "generator.stop").count(),
        1
    );
    assert_eq!(hammer.phase(Role::Generator), Some(Phase::DeInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_is_refused() {
    support::init_logging();
    let fixture = Fixture::new();
    let mut hammer = fake_hammer(&fixture, |config| config.generator.count = Some(1));
    hammer.init("127.0.0.1:0").await.expect("init");

    hammer.run().await.expect("first run");

    assert!(matches!(hammer.run().await, Err(HammerError::AlreadyRunning)));
}
