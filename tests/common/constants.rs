//! Shared constants for integration tests
//!
//! This module contains the ids of the fixture records. When the fixture
//! data changes, update only this file and `fixtures.rs`.

// ============================================================================
// Users and projects
// ============================================================================

/// Leader of Team A, requester of requests 2, 6 and 7
pub const USER_1: i64 = 1;

/// Member of Team A and leader of Group B
pub const USER_2: i64 = 2;

/// Member of Team A
pub const USER_3: i64 = 3;

/// Only member of Team C, which has no leader
pub const USER_4: i64 = 4;

/// Not known to the identity provider
pub const UNKNOWN_USER: i64 = 99;

/// Holds tasks 1 to 3, every request and every group
pub const PROJECT_1: i64 = 1;

/// Holds task 4 only
pub const PROJECT_2: i64 = 2;

// ============================================================================
// Tasks
// ============================================================================

/// "Task 1", owned by user 1, referenced by request 1
pub const TASK_1_ID: i64 = 1;

/// "Task 2", owned by user 2, referenced by requests 2 and 3
pub const TASK_2_ID: i64 = 2;

/// "Task 3", owned by user 1, referenced by requests 5, 6 and 7
pub const TASK_3_ID: i64 = 3;

/// "Task 4" in project 2, not referenced by any request
pub const TASK_4_ID: i64 = 4;

pub const TASK_1_NAME: &str = "Task 1";

// ============================================================================
// Requests
// ============================================================================

/// New, requester 2, resource 1 (not in any team)
pub const REQUEST_1_ID: i64 = 1;

/// New, requester 1, resource 2, two details
pub const REQUEST_2_ID: i64 = 2;

/// Ready, requester 2, resource 3, approver 1, one detail
pub const REQUEST_3_ID: i64 = 3;

/// Denied, requester 2, resource 3, approver 1, no details
pub const REQUEST_5_ID: i64 = 5;

/// Ready, requester 1, resource 3, approver 1
pub const REQUEST_6_ID: i64 = 6;

/// New, requester 1, resource 4 (only in a leaderless team)
pub const REQUEST_7_ID: i64 = 7;

/// Never created
pub const MISSING_REQUEST_ID: i64 = 4;

// ============================================================================
// Groups
// ============================================================================

/// "Team A", team led by user 1, members 2 and 3
pub const GROUP_A_ID: i64 = 1;

/// "Group B", plain group led by user 2, child of Team A, member 1
pub const GROUP_B_ID: i64 = 2;

/// "Team C", team without a leader, member 4
pub const GROUP_C_ID: i64 = 3;

/// Membership of user 2 in Team A
pub const MEMBERSHIP_A_USER_2: i64 = 1;

/// Membership of user 3 in Team A
pub const MEMBERSHIP_A_USER_3: i64 = 2;
