/// 全てのシミュレーションモデルが実装する基本インターフェース
///
/// 各フックは成功時に `true` を返します。既定実装はすべて何もせず成功します。
/// フックは該当ステージの一巡ごとに一度、登録順に呼ばれることだけを前提にしてください。
pub trait Model: Send {
    /// モデルの名前（構築時に固定）
    fn get_name(&self) -> &str;

    /// フレーム間の最小間隔（ミリ秒、参考値）
    fn get_target_frame_interval(&self) -> u32;

    /// リソースの読み込み
    fn load(&mut self) -> bool {
        true
    }

    /// 初期条件の設定
    fn init(&mut self) -> bool {
        true
    }

    /// 再初期化
    fn reinit(&mut self) -> bool {
        true
    }

    /// 1ステップの処理実行
    fn run(&mut self) -> bool {
        true
    }

    /// 一時停止中の処理
    fn hold(&mut self) -> bool {
        true
    }

    /// リソースの解放
    fn unload(&mut self) -> bool {
        true
    }
}
