//! Spoken prompts for the call flow.

pub const GATHER_PROMPT: &str = "こんにちは。シリアルコードを入力してください。";
pub const NO_INPUT: &str = "入力が確認できませんでした。もう一度おかけ直しください。";
pub const CODE_NOT_FOUND: &str =
    "入力されたシリアルコードが見つかりません。もう一度確認してください。";
pub const QUOTA_EXHAUSTED: &str = "このシリアルコードは使用回数の上限に達しています。";
pub const SYSTEM_ERROR: &str = "システムエラーが発生しました。管理者に問い合わせてください。";
pub const DISPATCH_FAILED: &str = "電話の発信中にエラーが発生しました。";
pub const DISPATCH_OK: &str = "認証に成功しました。一度電話を切らせていただきます。すぐに折り返しお電話いたしますので、少々お待ちください。";
pub const FULFILLMENT_MISSING_CODE: &str = "システムエラーです。コード情報が見つかりません。";
pub const CLOSING: &str = "ご利用ありがとうございました。";
