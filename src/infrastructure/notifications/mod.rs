pub mod admin_mail;
