mod common;

use common::{amount, dates, sample_ledger, schedule, ymd};
use moneyguru_core::ledger::{Removal, RepeatType, Schedule, ScheduleScope, Transaction};
use moneyguru_core::EngineError;

#[test]
fn occurrences_are_strictly_increasing_for_every_repeat_type() {
    let fixture = sample_ledger();
    let starts = [
        ymd(2020, 1, 31),
        ymd(2020, 2, 29),
        ymd(2021, 5, 30),
        ymd(2022, 12, 31),
        ymd(2023, 3, 1),
    ];
    for repeat_type in RepeatType::ALL {
        for every in 1..=4 {
            for start in starts {
                let schedule = schedule(&fixture, start, repeat_type, every, None);
                let occurrences: Vec<_> = schedule
                    .occurrences_in_range(ymd(2019, 1, 1), ymd(2026, 12, 31))
                    .collect();
                assert!(!occurrences.is_empty(), "{repeat_type} every {every} from {start}");
                assert!(occurrences[0] >= start);
                assert!(
                    occurrences.windows(2).all(|pair| pair[0] < pair[1]),
                    "{repeat_type} every {every} from {start} is not strictly increasing"
                );
            }
        }
    }
}

#[test]
fn occurrence_window_is_restartable() {
    let fixture = sample_ledger();
    let schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Daily, 3, None);
    let iter = schedule.occurrences_in_range(ymd(2008, 9, 20), ymd(2008, 9, 30));
    let first: Vec<_> = iter.clone().collect();
    let second: Vec<_> = iter.collect();

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![ymd(2008, 9, 22), ymd(2008, 9, 25), ymd(2008, 9, 28)]
    );
}

#[test]
fn monthly_from_january_31st_clamps_to_month_end() {
    let fixture = sample_ledger();
    let schedule = schedule(&fixture, ymd(2021, 1, 31), RepeatType::Monthly, 1, None);
    let occurrences: Vec<_> = schedule
        .occurrences_in_range(ymd(2021, 1, 1), ymd(2021, 4, 30))
        .collect();

    assert_eq!(
        occurrences,
        vec![
            ymd(2021, 1, 31),
            ymd(2021, 2, 28),
            ymd(2021, 3, 31),
            ymd(2021, 4, 30)
        ]
    );
}

#[test]
fn yearly_leap_day_falls_back_to_february_28th() {
    let fixture = sample_ledger();
    let schedule = schedule(&fixture, ymd(2008, 2, 29), RepeatType::Yearly, 1, None);
    let occurrences: Vec<_> = schedule
        .occurrences_in_range(ymd(2009, 1, 1), ymd(2012, 12, 31))
        .collect();

    assert_eq!(
        occurrences,
        vec![
            ymd(2009, 2, 28),
            ymd(2010, 2, 28),
            ymd(2011, 2, 28),
            ymd(2012, 2, 29)
        ]
    );
}

#[test]
fn zero_repeat_every_is_an_invalid_schedule() {
    let fixture = sample_ledger();
    let template = Transaction::transfer(
        ymd(2008, 9, 13),
        Some(fixture.checking),
        Some(fixture.rent),
        amount("1"),
    );

    let result = Schedule::new(template, ymd(2008, 9, 13), RepeatType::Weekly, 0, None);

    assert!(matches!(result, Err(EngineError::InvalidSchedule(_))));
}

#[test]
fn stop_date_before_start_is_an_invalid_schedule() {
    let fixture = sample_ledger();
    let template = Transaction::new(ymd(2008, 9, 13));
    let result = Schedule::new(
        template,
        ymd(2008, 9, 13),
        RepeatType::Daily,
        1,
        Some(ymd(2008, 9, 12)),
    );
    assert!(matches!(result, Err(EngineError::InvalidSchedule(_))));

    let mut valid = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Daily, 1, None);
    assert!(valid.set_stop_date(Some(ymd(2008, 9, 1))).is_err());
    assert_eq!(valid.stop_date(), None);
}

#[test]
fn stop_date_is_inclusive() {
    let fixture = sample_ledger();
    let schedule = schedule(
        &fixture,
        ymd(2008, 9, 13),
        RepeatType::Daily,
        1,
        Some(ymd(2008, 9, 15)),
    );
    let spawns = schedule.spawns_in_range(ymd(2008, 1, 1), ymd(2009, 1, 1));
    assert_eq!(
        dates(&spawns),
        vec![ymd(2008, 9, 13), ymd(2008, 9, 14), ymd(2008, 9, 15)]
    );
}

#[test]
fn third_monday_of_the_month() {
    let fixture = sample_ledger();
    let schedule = schedule(&fixture, ymd(2008, 9, 15), RepeatType::WeekdayOfMonth, 1, None);
    let occurrences: Vec<_> = schedule
        .occurrences_in_range(ymd(2008, 9, 16), ymd(2008, 12, 31))
        .collect();

    assert_eq!(
        occurrences,
        vec![ymd(2008, 10, 20), ymd(2008, 11, 17), ymd(2008, 12, 15)]
    );
}

#[test]
fn fifth_weekday_skips_months_without_one() {
    let fixture = sample_ledger();
    let schedule = schedule(&fixture, ymd(2008, 9, 30), RepeatType::WeekdayOfMonth, 1, None);
    let occurrences: Vec<_> = schedule
        .occurrences_in_range(ymd(2008, 9, 1), ymd(2008, 12, 31))
        .collect();

    assert_eq!(occurrences, vec![ymd(2008, 9, 30), ymd(2008, 12, 30)]);
}

#[test]
fn last_weekday_of_the_month() {
    let fixture = sample_ledger();
    let schedule = schedule(
        &fixture,
        ymd(2008, 9, 30),
        RepeatType::LastWeekdayOfMonth,
        1,
        None,
    );
    let occurrences: Vec<_> = schedule
        .occurrences_in_range(ymd(2008, 10, 1), ymd(2008, 12, 31))
        .collect();

    assert_eq!(
        occurrences,
        vec![ymd(2008, 10, 28), ymd(2008, 11, 25), ymd(2008, 12, 30)]
    );
}

#[test]
fn local_change_only_affects_one_occurrence() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    let mut edited = schedule.materialize(ymd(2008, 9, 20)).unwrap();
    edited.description = "Late rent".into();
    edited.date = ymd(2008, 9, 22);

    schedule
        .change_occurrence(ymd(2008, 9, 20), edited, ScheduleScope::Local)
        .unwrap();

    let spawns = schedule.spawns_in_range(ymd(2008, 9, 13), ymd(2008, 9, 27));
    assert_eq!(
        dates(&spawns),
        vec![ymd(2008, 9, 13), ymd(2008, 9, 22), ymd(2008, 9, 27)]
    );
    assert_eq!(spawns[1].description, "Late rent");
    assert_eq!(spawns[2].description, "Rent");
    assert_eq!(
        spawns[1].spawn.map(|origin| origin.recurrence_date),
        Some(ymd(2008, 9, 20))
    );
}

#[test]
fn global_change_shifts_later_occurrences() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    let mut edited = schedule.materialize(ymd(2008, 9, 27)).unwrap();
    edited.description = "New rent".into();
    edited.date = ymd(2008, 9, 28);

    schedule
        .change_occurrence(ymd(2008, 9, 27), edited, ScheduleScope::Global)
        .unwrap();

    let spawns = schedule.spawns_in_range(ymd(2008, 9, 13), ymd(2008, 10, 5));
    assert_eq!(
        dates(&spawns),
        vec![
            ymd(2008, 9, 13),
            ymd(2008, 9, 20),
            ymd(2008, 9, 28),
            ymd(2008, 10, 5)
        ]
    );
    let descriptions: Vec<_> = spawns.iter().map(|txn| txn.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Rent", "Rent", "New rent", "New rent"]);
}

#[test]
fn global_change_on_first_occurrence_replaces_template() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    schedule
        .delete_occurrence(ymd(2008, 9, 20), ScheduleScope::Local)
        .unwrap();
    let mut edited = schedule.materialize(ymd(2008, 9, 13)).unwrap();
    edited.payee = "Landlord".into();

    schedule
        .change_occurrence(ymd(2008, 9, 13), edited, ScheduleScope::Global)
        .unwrap();

    assert_eq!(schedule.template.payee, "Landlord");
    assert_eq!(schedule.start_date(), ymd(2008, 9, 13));
    let spawns = schedule.spawns_in_range(ymd(2008, 9, 13), ymd(2008, 9, 27));
    assert_eq!(dates(&spawns), vec![ymd(2008, 9, 13), ymd(2008, 9, 27)]);
}

#[test]
fn editing_a_non_occurrence_is_rejected() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    let txn = Transaction::new(ymd(2008, 9, 14));

    assert!(matches!(
        schedule.change_occurrence(ymd(2008, 9, 14), txn, ScheduleScope::Local),
        Err(EngineError::Validation(_))
    ));
    assert!(schedule.exceptions().is_empty());
}

#[test]
fn local_delete_skips_one_occurrence() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);

    let removal = schedule
        .delete_occurrence(ymd(2008, 9, 20), ScheduleScope::Local)
        .unwrap();

    assert_eq!(removal, Removal::Skipped);
    assert!(schedule.materialize(ymd(2008, 9, 20)).is_none());
    let spawns = schedule.spawns_in_range(ymd(2008, 9, 13), ymd(2008, 9, 27));
    assert_eq!(dates(&spawns), vec![ymd(2008, 9, 13), ymd(2008, 9, 27)]);
}

#[test]
fn global_delete_stops_the_schedule() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);

    let removal = schedule
        .delete_occurrence(ymd(2008, 9, 27), ScheduleScope::Global)
        .unwrap();

    assert_eq!(removal, Removal::Truncated);
    assert_eq!(schedule.stop_date(), Some(ymd(2008, 9, 26)));
    let spawns = schedule.spawns_in_range(ymd(2008, 9, 1), ymd(2008, 12, 31));
    assert_eq!(dates(&spawns), vec![ymd(2008, 9, 13), ymd(2008, 9, 20)]);

    assert_eq!(
        schedule
            .delete_occurrence(ymd(2008, 9, 13), ScheduleScope::Global)
            .unwrap(),
        Removal::Exhausted
    );
}

#[test]
fn detached_occurrence_becomes_a_regular_transaction() {
    let fixture = sample_ledger();
    let mut schedule = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);

    let detached = schedule.detach(ymd(2008, 9, 20)).unwrap();

    assert!(!detached.is_spawn());
    assert_eq!(detached.date, ymd(2008, 9, 20));
    assert_eq!(detached.amount(), amount("800.00"));
    assert!(schedule.materialize(ymd(2008, 9, 20)).is_none());
    assert!(schedule.detach(ymd(2008, 9, 21)).is_none());
}

#[test]
fn cooked_transactions_merge_regular_entries_and_spawns() {
    let mut fixture = sample_ledger();
    let weekly = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    let regular = Transaction::transfer(
        ymd(2008, 9, 15),
        Some(fixture.checking),
        Some(fixture.groceries),
        amount("12.50"),
    );
    fixture.ledger.add_transaction(regular.clone());
    fixture.ledger.upsert_schedule(weekly);

    let cooked = fixture
        .ledger
        .cooked_transactions(ymd(2008, 9, 1), ymd(2008, 9, 21));

    assert_eq!(
        dates(&cooked),
        vec![ymd(2008, 9, 13), ymd(2008, 9, 15), ymd(2008, 9, 20)]
    );
    assert_eq!(cooked[1].id, regular.id);
    assert!(cooked[0].is_spawn() && cooked[2].is_spawn());
}

#[test]
fn removing_an_account_reassigns_schedule_splits() {
    let mut fixture = sample_ledger();
    let mut weekly = schedule(&fixture, ymd(2008, 9, 13), RepeatType::Weekly, 1, None);
    let mut edited = weekly.materialize(ymd(2008, 9, 20)).unwrap();
    edited.description = "Override".into();
    weekly
        .change_occurrence(ymd(2008, 9, 20), edited, ScheduleScope::Local)
        .unwrap();
    let schedule_id = weekly.id;
    fixture.ledger.upsert_schedule(weekly);

    let removed = fixture
        .ledger
        .remove_account(fixture.rent, Some(fixture.groceries))
        .unwrap();

    assert_eq!(removed.name, "Rent");
    assert!(fixture.ledger.account(fixture.rent).is_none());
    let stored = fixture.ledger.schedule(schedule_id).unwrap();
    assert_eq!(stored.template.to_account(), Some(fixture.groceries));
    let spawns = stored.spawns_in_range(ymd(2008, 9, 13), ymd(2008, 9, 20));
    assert!(spawns
        .iter()
        .all(|txn| txn.to_account() == Some(fixture.groceries)));
}

#[test]
fn huge_repeat_every_yields_only_the_start_date() {
    let fixture = sample_ledger();
    for repeat_type in RepeatType::ALL {
        let schedule = schedule(&fixture, ymd(2021, 1, 31), repeat_type, 2_147_483_000, None);
        let occurrences: Vec<_> = schedule
            .occurrences_in_range(ymd(2021, 1, 1), ymd(2030, 1, 1))
            .collect();
        assert!(occurrences.len() <= 1, "{repeat_type}: {occurrences:?}");
        assert!(occurrences.iter().all(|date| *date >= ymd(2021, 1, 31)));
    }
}
