//! Diesel table definitions.
//!
//! These must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Accounts for students, teachers, and admins.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        /// Lower-cased; unique.
        email -> Varchar,
        password_hash -> Text,
        role -> Varchar,
        instruments -> Array<Text>,
        experience -> Nullable<Text>,
        bio -> Nullable<Text>,
        location -> Nullable<Text>,
        hourly_rate -> Nullable<Int4>,
        profile_image_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bearer tokens keyed by SHA-256 digest; raw tokens are never stored.
    auth_tokens (digest) {
        digest -> Varchar,
        user_id -> Uuid,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per teacher and date; slots stored as `HH:MM-HH:MM` strings.
    availability_days (id) {
        id -> Uuid,
        teacher_id -> Uuid,
        date -> Date,
        slots -> Array<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        student_id -> Uuid,
        teacher_id -> Uuid,
        date -> Date,
        start_time -> Time,
        end_time -> Time,
        message -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    resources (id) {
        id -> Uuid,
        teacher_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        file_url -> Text,
        file_type -> Varchar,
        instrument -> Varchar,
        level -> Varchar,
        category -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    resource_assignments (resource_id, student_id) {
        resource_id -> Uuid,
        student_id -> Uuid,
        assigned_at -> Timestamptz,
    }
}

diesel::table! {
    practice_sessions (id) {
        id -> Uuid,
        student_id -> Uuid,
        instrument -> Varchar,
        duration_minutes -> Int4,
        focus -> Nullable<Text>,
        notes -> Nullable<Text>,
        practiced_at -> Timestamptz,
    }
}

diesel::table! {
    practice_goals (id) {
        id -> Uuid,
        student_id -> Uuid,
        title -> Varchar,
        instrument -> Nullable<Varchar>,
        target_minutes_per_week -> Int4,
        due_date -> Nullable<Date>,
        completed -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    practice_recordings (id) {
        id -> Uuid,
        student_id -> Uuid,
        /// Teacher the recording is shared with; cleared if they are deleted.
        teacher_id -> Nullable<Uuid>,
        title -> Varchar,
        file_url -> Text,
        duration_seconds -> Nullable<Int4>,
        notes -> Nullable<Text>,
        teacher_feedback -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    community_posts (id) {
        id -> Uuid,
        author_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        media_url -> Nullable<Text>,
        media_type -> Varchar,
        instrument -> Nullable<Varchar>,
        visibility -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    post_likes (post_id, user_id) {
        post_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    post_comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        author_id -> Uuid,
        text -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        sender_id -> Uuid,
        recipient_id -> Uuid,
        text -> Text,
        read_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    inquiries (id) {
        id -> Uuid,
        student_id -> Uuid,
        teacher_id -> Uuid,
        instrument -> Varchar,
        level -> Varchar,
        age_group -> Nullable<Varchar>,
        lesson_type -> Nullable<Varchar>,
        availability -> Nullable<Text>,
        goals -> Nullable<Text>,
        message -> Text,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(availability_days -> users (teacher_id));
diesel::joinable!(resources -> users (teacher_id));
diesel::joinable!(resource_assignments -> resources (resource_id));
diesel::joinable!(practice_sessions -> users (student_id));
diesel::joinable!(practice_goals -> users (student_id));
diesel::joinable!(community_posts -> users (author_id));
diesel::joinable!(post_likes -> community_posts (post_id));
diesel::joinable!(post_comments -> community_posts (post_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    availability_days,
    bookings,
    resources,
    resource_assignments,
    practice_sessions,
    practice_goals,
    practice_recordings,
    community_posts,
    post_likes,
    post_comments,
    messages,
    inquiries,
);
