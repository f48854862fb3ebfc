use rattendance::core::attendance::{
    bulk_alter, mark_absent_self, record_scan, record_scan_with_code, resolve, scan_status,
};
use rattendance::core::business::create_business;
use rattendance::core::events::create_event;
use rattendance::core::join_code::{JoinCodePolicy, issue_scan_code};
use rattendance::core::notify::{NoopNotifier, Notifier};
use rattendance::core::stats::{
    StatsFilter, StatusCounts, aggregate_member_stats, get_member_stats, member_timeline,
};
use rattendance::db::repository::{EventFilter, Repository};
use rattendance::db::ttl_store::MemoryTtlStore;
use rattendance::models::event::{Event, NewEvent};
use rattendance::models::record::Record;
use rattendance::models::status::AttendanceStatus;
use std::cell::RefCell;

mod common;
use common::{business_with_members, ts};

#[test]
fn standup_scenario_from_na_to_absent_or_present() {
    let (mut pool, bid) = business_with_members(&["ann", "bob"]);
    let ev = create_event(
        &mut pool,
        &NewEvent::new(bid, "Standup", ts(2025, 9, 1, 9, 0), ts(2025, 9, 1, 10, 0)),
    )
    .unwrap();

    let ann = pool.conn.get_record(ev.id, "ann").unwrap();
    assert_eq!(
        resolve(&ev, ann.as_ref(), ts(2025, 9, 1, 9, 30)),
        AttendanceStatus::NotApplicable
    );
    assert_eq!(
        resolve(&ev, ann.as_ref(), ts(2025, 9, 1, 10, 1)),
        AttendanceStatus::Absent
    );

    record_scan(&mut pool, ev.id, "bob", ts(2025, 9, 1, 9, 45), None).unwrap();
    let bob = pool.conn.get_record(ev.id, "bob").unwrap();
    assert_eq!(
        resolve(&ev, bob.as_ref(), ts(2025, 9, 1, 10, 1)),
        AttendanceStatus::Present
    );
}

#[test]
fn resolution_never_goes_back_to_na() {
    let (mut pool, bid) = business_with_members(&[]);
    let ev = create_event(&mut pool, &NewEvent::new(bid, "Meet", 1_000, 2_000)).unwrap();

    let mut seen_absent = false;
    for now in (0..4_000).step_by(100) {
        let s = resolve(&ev, None, now);
        if seen_absent {
            assert_eq!(s, AttendanceStatus::Absent);
        }
        seen_absent |= s == AttendanceStatus::Absent;
    }
    assert!(seen_absent);
}

#[test]
fn scan_replaces_previous_record_and_honors_grace_period() {
    let (mut pool, bid) = business_with_members(&["ann"]);
    let start = ts(2025, 9, 1, 9, 0);
    let ev = create_event(&mut pool, &NewEvent::new(bid, "Class", start, start + 3_600)).unwrap();

    mark_absent_self(&mut pool, &NoopNotifier, ev.id, "ann", start - 86_400).unwrap();
    let rec = record_scan(&mut pool, ev.id, "ann", start + 20 * 60, Some(10)).unwrap();
    assert_eq!(rec.status, AttendanceStatus::Late);

    let stored = pool.conn.get_record(ev.id, "ann").unwrap().unwrap();
    assert_eq!(stored, rec);
    assert_eq!(pool.conn.records_by_business(bid).unwrap().len(), 1);
}

#[test]
fn non_members_cannot_scan() {
    let (mut pool, bid) = business_with_members(&["ann"]);
    let ev = create_event(&mut pool, &NewEvent::new(bid, "Class", 0, 3_600)).unwrap();

    let err = record_scan(&mut pool, ev.id, "mallory", 10, None).unwrap_err();
    assert!(err.is_not_found());
    let err = record_scan(&mut pool, 9_999, "ann", 10, None).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn scan_code_only_works_for_its_own_business() {
    let (mut pool, bid) = business_with_members(&["ann"]);
    let other = create_business(&mut pool, "Other", false, None, &JoinCodePolicy::default())
        .unwrap();
    let ev = create_event(&mut pool, &NewEvent::new(bid, "Class", 0, 3_600)).unwrap();
    let store = MemoryTtlStore::new();

    let foreign = issue_scan_code(&pool.conn, &store, other.id, 300, 0).unwrap();
    let err = record_scan_with_code(&mut pool, &store, &foreign.code, ev.id, "ann", 10, None)
        .unwrap_err();
    assert!(err.is_not_found());

    let own = issue_scan_code(&pool.conn, &store, bid, 300, 0).unwrap();
    let rec =
        record_scan_with_code(&mut pool, &store, &own.code, ev.id, "ann", 10, None).unwrap();
    assert_eq!(rec.status, AttendanceStatus::Present);

    // expired
    let err = record_scan_with_code(&mut pool, &store, &own.code, ev.id, "ann", 300, None)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn bulk_alter_reports_per_item_and_commits_the_rest() {
    let (mut pool, bid) = business_with_members(&["ann", "bob"]);
    let e1 = create_event(&mut pool, &NewEvent::new(bid, "One", 0, 100)).unwrap();
    let e2 = create_event(&mut pool, &NewEvent::new(bid, "Two", 200, 300)).unwrap();

    let users = vec!["ann".to_string(), "ghost".to_string(), "bob".to_string()];
    let report = bulk_alter(
        &mut pool,
        &[e1.id, 4_242, e2.id],
        &users,
        AttendanceStatus::Excused,
        500,
    )
    .unwrap();

    assert_eq!(report.succeeded.len(), 4);
    // ghost twice, plus every user of the unknown event
    assert_eq!(report.failed.len(), 5);
    assert!(report.failed.iter().any(|f| f.event_id == 4_242));

    let stored = pool.conn.records_by_business(bid).unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|r| r.status == AttendanceStatus::Excused));
}

#[test]
fn bulk_alter_rejects_derived_status_before_writing() {
    let (mut pool, bid) = business_with_members(&["ann"]);
    let ev = create_event(&mut pool, &NewEvent::new(bid, "One", 0, 100)).unwrap();

    let err = bulk_alter(
        &mut pool,
        &[ev.id],
        &["ann".to_string()],
        AttendanceStatus::NotApplicable,
        500,
    )
    .unwrap_err();
    assert!(err.is_validation());
    assert!(pool.conn.records_by_business(bid).unwrap().is_empty());
}

#[test]
fn member_stats_add_up_and_skip_unfinished_events() {
    let (mut pool, bid) = business_with_members(&["ann", "bob"]);
    let past: Vec<i64> = (0..4)
        .map(|i| {
            create_event(
                &mut pool,
                &NewEvent::new(bid, "Past", i * 1_000, i * 1_000 + 500),
            )
            .unwrap()
            .id
        })
        .collect();
    let future = create_event(&mut pool, &NewEvent::new(bid, "Future", 50_000, 51_000))
        .unwrap()
        .id;

    record_scan(&mut pool, past[0], "ann", 10, None).unwrap();
    bulk_alter(
        &mut pool,
        &[past[1]],
        &["ann".to_string()],
        AttendanceStatus::Late,
        1_100,
    )
    .unwrap();
    mark_absent_self(&mut pool, &NoopNotifier, past[2], "ann", 0).unwrap();
    record_scan(&mut pool, future, "ann", 49_990, None).unwrap();

    let now = 10_000;
    let rows = get_member_stats(&pool.conn, bid, &StatsFilter::default(), now).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let c = row.counts;
        assert_eq!(c.total, 4);
        assert_eq!(c.present + c.late + c.excused + c.absent, c.total);
    }
    let ann = rows.iter().find(|r| r.user_id == "ann").unwrap();
    assert_eq!((ann.counts.present, ann.counts.late, ann.counts.absent), (1, 1, 2));

    let with_upcoming = StatsFilter {
        include_upcoming: true,
        ..Default::default()
    };
    let rows = get_member_stats(&pool.conn, bid, &with_upcoming, now).unwrap();
    let ann = rows.iter().find(|r| r.user_id == "ann").unwrap();
    let bob = rows.iter().find(|r| r.user_id == "bob").unwrap();
    assert_eq!(ann.counts.total, 5);
    assert_eq!(bob.counts.total, 4);
}

#[test]
fn timeline_resolves_each_event() {
    let (mut pool, bid) = business_with_members(&["ann"]);
    let done = create_event(&mut pool, &NewEvent::new(bid, "Done", 0, 100)).unwrap();
    let later = create_event(&mut pool, &NewEvent::new(bid, "Later", 1_000, 1_100)).unwrap();
    record_scan(&mut pool, later.id, "ann", 990, None).unwrap();

    let tl = member_timeline(&pool.conn, bid, "ann", &EventFilter::default(), 500).unwrap();
    let statuses: Vec<(i64, AttendanceStatus)> =
        tl.iter().map(|t| (t.event.id, t.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (done.id, AttendanceStatus::Absent),
            (later.id, AttendanceStatus::Present)
        ]
    );
    assert_eq!(tl[1].recorded_at, Some(990));

    let err = member_timeline(&pool.conn, bid, "ghost", &EventFilter::default(), 500).unwrap_err();
    assert!(err.is_not_found());
}

fn event(id: i64, start: i64, end: i64) -> Event {
    Event {
        id,
        business_id: 1,
        name: format!("E{id}"),
        description: String::new(),
        start,
        end,
        repeat_id: None,
        tag: String::new(),
    }
}

fn rec(event_id: i64, status: AttendanceStatus) -> Record {
    Record::new(event_id, 1, "u", 0, status)
}

#[test]
fn missing_record_turns_absent_once_the_event_ends() {
    let ev = event(1, 1_000, 2_000);
    assert_eq!(resolve(&ev, None, 1_500), AttendanceStatus::NotApplicable);
    assert_eq!(resolve(&ev, None, 1_999), AttendanceStatus::NotApplicable);
    assert_eq!(resolve(&ev, None, 2_000), AttendanceStatus::Absent);
    assert_eq!(resolve(&ev, None, 9_999), AttendanceStatus::Absent);
}

#[test]
fn stored_record_wins_regardless_of_time() {
    let ev = event(1, 1_000, 2_000);
    let r = Record::new(1, 1, "u", 1_200, AttendanceStatus::Excused);
    assert_eq!(resolve(&ev, Some(&r), 500), AttendanceStatus::Excused);
    assert_eq!(resolve(&ev, Some(&r), 5_000), AttendanceStatus::Excused);
}

#[test]
fn late_only_after_the_grace_period() {
    let ev = event(1, 0, 3_600);
    assert_eq!(scan_status(&ev, 900, None), AttendanceStatus::Present);
    assert_eq!(scan_status(&ev, 600, Some(10)), AttendanceStatus::Present);
    assert_eq!(scan_status(&ev, 601, Some(10)), AttendanceStatus::Late);
}

#[derive(Default)]
struct Recorder(RefCell<Vec<(i64, String)>>);

impl Notifier for Recorder {
    fn absence_reported(&self, event: &Event, record: &Record) {
        self.0.borrow_mut().push((event.id, record.user_id.clone()));
    }
}

#[test]
fn self_marked_absence_notifies_once_committed() {
    let (mut pool, bid) = business_with_members(&["u1"]);
    let ev = create_event(&mut pool, &NewEvent::new(bid, "Meet", 1_000, 2_000)).unwrap();

    let recorder = Recorder::default();
    let r = mark_absent_self(&mut pool, &recorder, ev.id, "u1", 50_000).unwrap();
    assert_eq!(r.status, AttendanceStatus::AbsentSelf);
    assert_eq!(recorder.0.borrow().as_slice(), &[(ev.id, "u1".to_string())]);

    let err = mark_absent_self(&mut pool, &recorder, ev.id, "ghost", 50_000).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(recorder.0.borrow().len(), 1);
}

#[test]
fn self_marked_absence_is_distinct_but_counts_as_absent() {
    let s = AttendanceStatus::from_db_str("ABSENT(self-marked)").unwrap();
    assert_ne!(s, AttendanceStatus::Absent);
    assert!(s.counts_as_absent());
    assert!(!AttendanceStatus::Late.counts_as_absent());
    assert!(!AttendanceStatus::NotApplicable.is_storable());
    assert!(AttendanceStatus::Excused.is_storable());
}

#[test]
fn status_input_aliases() {
    assert_eq!(
        AttendanceStatus::from_input(" Late "),
        Some(AttendanceStatus::Late)
    );
    assert_eq!(
        AttendanceStatus::from_input("self"),
        Some(AttendanceStatus::AbsentSelf)
    );
    assert_eq!(AttendanceStatus::from_input("maybe"), None);
}

#[test]
fn aggregated_counts_always_sum_to_total() {
    let events: Vec<Event> = (1..=7).map(|id| event(id, id * 100, id * 100 + 50)).collect();
    let records = vec![
        rec(1, AttendanceStatus::Present),
        rec(2, AttendanceStatus::Late),
        rec(3, AttendanceStatus::Excused),
        rec(4, AttendanceStatus::AbsentSelf),
        rec(5, AttendanceStatus::Absent),
        // duplicate of an event already counted
        rec(1, AttendanceStatus::Late),
        // outside the event set
        rec(42, AttendanceStatus::Present),
    ];

    let c = aggregate_member_stats(&events, &records);
    assert_eq!(c.total, 7);
    assert_eq!((c.present, c.late, c.excused, c.absent), (1, 1, 1, 4));
    assert_eq!(c.present + c.late + c.excused + c.absent, c.total);
}

#[test]
fn derived_status_in_a_record_counts_like_no_record() {
    let events = vec![event(1, 0, 50), event(2, 100, 150)];
    let records = vec![
        rec(1, AttendanceStatus::NotApplicable),
        rec(2, AttendanceStatus::Present),
    ];
    let c = aggregate_member_stats(&events, &records);
    assert_eq!((c.total, c.present, c.absent), (2, 1, 1));
}

#[test]
fn empty_event_set_has_no_counts() {
    let c = aggregate_member_stats(&[], &[rec(1, AttendanceStatus::Present)]);
    assert_eq!(c, StatusCounts::default());
    assert_eq!(c.attendance_rate(), 0.0);
}
